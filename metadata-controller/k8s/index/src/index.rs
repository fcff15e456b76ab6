use crate::pod;
use ahash::AHashMap as HashMap;
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, instrument, trace, warn};
use workload_metadata_controller_core::{DiscoverHostWorkloads, Workload};
use workload_metadata_controller_k8s_api::{self as k8s, ResourceExt};

pub type SharedIndex = Arc<RwLock<Index>>;

/// Indexes running pods by the node they are scheduled on.
#[derive(Debug, Default)]
pub struct Index {
    /// Each node's workloads, ordered by namespace and name.
    by_node: HashMap<String, NodeWorkloads>,

    /// The node each indexed pod is scheduled on.
    nodes_by_pod: HashMap<PodRef, String>,
}

type NodeWorkloads = BTreeMap<PodRef, Arc<Workload>>;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct PodRef {
    namespace: String,
    name: String,
}

// === impl Index ===

impl Index {
    pub fn shared() -> SharedIndex {
        Arc::new(RwLock::new(Self::default()))
    }

    /// Returns the workloads scheduled on `node`, ordered by namespace and name.
    pub fn workloads_on_node(&self, node: &str) -> Vec<Arc<Workload>> {
        self.by_node
            .get(node)
            .map(|workloads| workloads.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Iterates over each indexed node and the number of workloads on it.
    pub(crate) fn node_sizes(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.by_node
            .iter()
            .map(|(node, workloads)| (node.as_str(), workloads.len()))
    }

    pub fn len(&self) -> usize {
        self.nodes_by_pod.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_by_pod.is_empty()
    }

    fn insert(&mut self, node: String, key: PodRef, workload: Workload) {
        let moved = self
            .nodes_by_pod
            .get(&key)
            .map(|prior| *prior != node)
            .unwrap_or(false);
        if moved {
            debug!(%node, "Pod moved to a new node");
            self.remove(&key);
        }

        trace!(?workload);
        self.by_node
            .entry(node.clone())
            .or_default()
            .insert(key.clone(), Arc::new(workload));
        self.nodes_by_pod.insert(key, node);
    }

    fn remove(&mut self, key: &PodRef) -> bool {
        let node = match self.nodes_by_pod.remove(key) {
            Some(node) => node,
            None => return false,
        };

        if let Some(workloads) = self.by_node.get_mut(&node) {
            workloads.remove(key);
            if workloads.is_empty() {
                debug!(%node, "Node has no more workloads");
                self.by_node.remove(&node);
            }
        }
        true
    }
}

impl kubert::index::IndexNamespacedResource<k8s::Pod> for Index {
    #[instrument(
        skip_all,
        fields(
            ns = ?pod.metadata.namespace,
            name = %pod.name_any(),
        )
    )]
    fn apply(&mut self, pod: k8s::Pod) {
        let key = match pod.namespace() {
            Some(namespace) => PodRef {
                namespace,
                name: pod.name_any(),
            },
            None => {
                warn!("Ignoring pod without a namespace");
                return;
            }
        };

        let node = match pod::node_name(&pod) {
            Some(node) if !pod::is_terminated(&pod) => node.to_string(),
            node => {
                // Pods that have not been scheduled or that have terminated are not reported.
                if self.remove(&key) {
                    debug!(?node, "Removed pod");
                } else {
                    trace!(?node, "Ignoring pod");
                }
                return;
            }
        };

        match pod::workload(pod) {
            Ok(workload) => {
                debug!(%node, "Indexed pod");
                self.insert(node, key, workload);
            }
            Err(error) => warn!(%error, "Failed to index pod"),
        }
    }

    #[instrument(skip(self))]
    fn delete(&mut self, namespace: String, name: String) {
        if self.remove(&PodRef { namespace, name }) {
            debug!("Removed pod");
        }
    }
}

impl DiscoverHostWorkloads for Index {
    fn workloads_on_host(&self, host: &str) -> Vec<Arc<Workload>> {
        self.workloads_on_node(host)
    }
}
