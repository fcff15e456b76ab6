//! Protobuf messages and services for workload metadata discovery.
//!
//! Generated from the definitions under `proto/`. Each message mirrors the upstream definition
//! field-for-field, so payloads are wire-compatible with proxies built against them.

// The generated code refers across packages with relative paths, so the modules must nest the
// same way the packages do.
pub mod envoy {
    pub mod config {
        pub mod core {
            pub mod v3 {
                tonic::include_proto!("envoy.config.core.v3");
            }
        }
    }

    pub mod service {
        pub mod discovery {
            pub mod v3 {
                tonic::include_proto!("envoy.service.discovery.v3");
            }
        }
    }
}

pub mod istio {
    pub mod telemetry {
        pub mod workloadmetadata {
            pub mod v1 {
                tonic::include_proto!("istio.telemetry.workloadmetadata.v1");
            }
        }
    }
}

pub use self::{
    envoy::{config::core::v3 as config, service::discovery::v3 as discovery},
    istio::telemetry::workloadmetadata::v1 as workload_metadata,
};
