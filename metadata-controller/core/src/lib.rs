#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod canonical;
mod classify;
pub mod workload;

pub use self::{
    canonical::{CanonicalService, ResolveCanonicalService, WellKnownLabels},
    classify::classify,
    workload::{
        ClassifiedWorkload, DiscoverHostWorkloads, Labels, OwnerReference, Workload, WorkloadKind,
    },
};

/// The label set by the ReplicaSet controller on every pod it creates, holding the hash of the
/// pod template. ReplicaSets created by a Deployment are named `<deployment>-<hash>`.
pub const POD_TEMPLATE_HASH_LABEL: &str = "pod-template-hash";
