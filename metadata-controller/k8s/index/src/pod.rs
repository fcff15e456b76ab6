use anyhow::{Context, Result};
use workload_metadata_controller_core::{OwnerReference, Workload};
use workload_metadata_controller_k8s_api::{self as k8s, ResourceExt};

/// Returns the name of the node a pod is scheduled on, if it has been scheduled.
pub(crate) fn node_name(pod: &k8s::Pod) -> Option<&str> {
    pod.spec
        .as_ref()?
        .node_name
        .as_deref()
        .filter(|n| !n.is_empty())
}

/// Indicates whether all of a pod's containers have terminated for good.
pub(crate) fn is_terminated(pod: &k8s::Pod) -> bool {
    matches!(
        pod.status.as_ref().and_then(|s| s.phase.as_deref()),
        Some("Succeeded" | "Failed")
    )
}

/// Converts a pod into a workload instance.
pub(crate) fn workload(pod: k8s::Pod) -> Result<Workload> {
    let namespace = pod.namespace().context("pod must have a namespace")?;
    let name = pod.name_any();

    let k8s::ObjectMeta {
        generate_name,
        labels,
        owner_references,
        ..
    } = pod.metadata;

    let containers = pod
        .spec
        .into_iter()
        .flat_map(|spec| spec.containers)
        .map(|c| c.name)
        .collect();

    let ips = pod
        .status
        .and_then(|status| status.pod_ips)
        .into_iter()
        .flatten()
        .map(|pip| pip.ip)
        .collect();

    let owner_references = owner_references
        .into_iter()
        .flatten()
        .map(|r| OwnerReference {
            kind: r.kind,
            name: r.name,
            controller: r.controller.unwrap_or(false),
        })
        .collect();

    Ok(Workload {
        name,
        namespace,
        generate_name,
        ips,
        containers,
        labels: labels.unwrap_or_default(),
        owner_references,
    })
}
