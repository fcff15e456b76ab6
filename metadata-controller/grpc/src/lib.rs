#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod encode;
pub mod generator;
pub mod metrics;
mod node;
pub mod proto;
pub mod server;

pub use self::{
    encode::{
        encode, FILTER_NAME, TYPED_EXTENSION_CONFIG_TYPE_URL, WORKLOAD_METADATA_RESOURCES_TYPE_URL,
    },
    generator::{Generator, WorkloadMetadataGenerator},
    node::NODE_NAME_METADATA,
    server::WorkloadMetadataServer,
};
