#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use workload_metadata_controller_core as core;
pub use workload_metadata_controller_grpc as grpc;
pub use workload_metadata_controller_k8s_api as k8s;
pub use workload_metadata_controller_k8s_index as index;

mod args;

pub use self::args::Args;

use std::sync::Arc;

/// Serves host lookups from the shared workload index.
#[derive(Clone, Debug)]
struct HostWorkloads(index::SharedIndex);

impl HostWorkloads {
    pub fn new(index: index::SharedIndex) -> Self {
        Self(index)
    }
}

impl core::DiscoverHostWorkloads for HostWorkloads {
    fn workloads_on_host(&self, host: &str) -> Vec<Arc<core::Workload>> {
        self.0.read().workloads_on_node(host)
    }
}
