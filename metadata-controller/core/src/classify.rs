use crate::{Workload, WorkloadKind, POD_TEMPLATE_HASH_LABEL};

/// Determines the logical workload that owns an instance.
///
/// Only the instance's own metadata is consulted: the controller reference is followed a single
/// hop and the owner's name is inferred from naming conventions rather than by querying the
/// cluster for the owning resource.
///
/// - An instance whose name was not generated is its own workload.
/// - Otherwise, the first ownership reference flagged as the controller is used (if several are
///   flagged, later ones are ignored). Without one, the instance is its own workload.
/// - A `ReplicaSet` named `<name>-<pod-template-hash>` is owned by the Deployment `<name>`. A
///   missing label is an empty hash, and `<name>` may be empty.
/// - A `Job` or `CronJob` controller is reported as-is. A Job's own owner (i.e. a CronJob) is
///   never resolved.
/// - Anything else is reported as a bare pod.
pub fn classify(workload: &Workload) -> (&str, WorkloadKind) {
    let bare = (workload.name.as_str(), WorkloadKind::Pod);

    if !workload.has_generated_name() {
        return bare;
    }

    let controller = match workload.controller_ref() {
        Some(r) => r,
        None => return bare,
    };

    match controller.kind.as_str() {
        "ReplicaSet" => {
            let hash = workload
                .labels
                .get(POD_TEMPLATE_HASH_LABEL)
                .map(String::as_str)
                .unwrap_or_default();
            deployment_name(&controller.name, hash)
                .map(|name| (name, WorkloadKind::Deployment))
                .unwrap_or(bare)
        }
        "Job" => (controller.name.as_str(), WorkloadKind::Job),
        "CronJob" => (controller.name.as_str(), WorkloadKind::CronJob),
        _ => bare,
    }
}

/// Strips a `-<hash>` suffix from a ReplicaSet name.
fn deployment_name<'n>(replica_set: &'n str, hash: &str) -> Option<&'n str> {
    replica_set.strip_suffix(hash)?.strip_suffix('-')
}
