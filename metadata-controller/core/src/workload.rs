use crate::canonical::CanonicalService;
use std::{collections::BTreeMap, fmt, sync::Arc};

pub type Labels = BTreeMap<String, String>;

/// A workload instance (i.e. a pod) as it is known to the workload index.
///
/// Instances are immutable once indexed: an update replaces the whole value, so a reader holding
/// an `Arc<Workload>` always observes a consistent view of a single point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Workload {
    pub name: String,
    pub namespace: String,

    /// The prefix the API server used to generate `name`, if the name was generated.
    pub generate_name: Option<String>,

    pub ips: Vec<String>,
    pub containers: Vec<String>,
    pub labels: Labels,

    /// Ownership references, in the order they appear on the object.
    pub owner_references: Vec<OwnerReference>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,

    /// Marks the managing controller. Kubernetes permits at most one such reference per object.
    pub controller: bool,
}

/// The kind of the logical workload that owns an instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Pod,
    Deployment,
    Job,
    CronJob,
}

/// A workload instance annotated with its logical owner and canonical service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedWorkload {
    pub workload_name: String,
    pub kind: WorkloadKind,
    pub instance_name: String,
    pub namespace: String,
    pub ips: Vec<String>,
    pub containers: Vec<String>,
    pub canonical: CanonicalService,
}

/// Looks up the workloads scheduled on a host.
pub trait DiscoverHostWorkloads {
    /// Returns the workloads currently indexed for `host`, in a stable order.
    ///
    /// An unknown host has no workloads.
    fn workloads_on_host(&self, host: &str) -> Vec<Arc<Workload>>;
}

impl<T: DiscoverHostWorkloads + ?Sized> DiscoverHostWorkloads for Arc<T> {
    #[inline]
    fn workloads_on_host(&self, host: &str) -> Vec<Arc<Workload>> {
        (**self).workloads_on_host(host)
    }
}

// === impl Workload ===

impl Workload {
    /// Indicates whether the API server generated this workload's name from a prefix.
    pub fn has_generated_name(&self) -> bool {
        self.generate_name
            .as_deref()
            .map(|prefix| !prefix.is_empty())
            .unwrap_or(false)
    }

    /// Returns the first ownership reference flagged as the controller.
    ///
    /// Malformed objects may carry more than one controller reference; later ones are ignored.
    pub fn controller_ref(&self) -> Option<&OwnerReference> {
        self.owner_references.iter().find(|r| r.controller)
    }
}

// === impl WorkloadKind ===

impl WorkloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pod => "pod",
            Self::Deployment => "deployment",
            Self::Job => "job",
            Self::CronJob => "cronjob",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
