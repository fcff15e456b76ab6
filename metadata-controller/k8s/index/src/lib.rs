//! Workload Index
//!
//! Maintains the set of running pods scheduled on each node, so that a proxy can be told about
//! every workload instance that shares its node. The index is fed by a pod watch (via
//! `kubert::index`) and read by the discovery server:
//!
//! ```text
//! [ Node ] -> [ (namespace, name) ] -> [ Workload ]
//! ```
//!
//! Only pods that are scheduled and not yet terminated are indexed. Each pod is converted into an
//! immutable `Workload` when it is applied; an update replaces the stored value wholesale, so
//! readers never observe a partially updated instance.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod index;
pub mod metrics;
mod pod;

#[cfg(test)]
mod tests;

pub use self::index::{Index, SharedIndex};
