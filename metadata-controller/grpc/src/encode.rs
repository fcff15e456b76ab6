use crate::proto::{
    config::TypedExtensionConfig,
    discovery::Resource,
    workload_metadata::{
        workload_metadata_resource::WorkloadType, WorkloadMetadataResource,
        WorkloadMetadataResources,
    },
};
use prost::Message;
use prost_types::Any;
use workload_metadata_controller_core::{ClassifiedWorkload, WorkloadKind};

/// The name of the listener filter that consumes workload metadata.
pub const FILTER_NAME: &str = "envoy.filters.listener.workload_metadata";

pub const WORKLOAD_METADATA_RESOURCES_TYPE_URL: &str =
    "type.googleapis.com/istio.telemetry.workloadmetadata.v1.WorkloadMetadataResources";

pub const TYPED_EXTENSION_CONFIG_TYPE_URL: &str =
    "type.googleapis.com/envoy.config.core.v3.TypedExtensionConfig";

/// Encodes a proxy's classified workloads as a single discovery resource.
///
/// The bundle is wrapped in a typed extension config for the workload metadata listener filter.
/// Workloads are emitted in the order given.
pub fn encode(
    proxy_id: &str,
    workloads: &[ClassifiedWorkload],
) -> Result<Resource, prost::EncodeError> {
    let bundle = WorkloadMetadataResources {
        proxy_id: proxy_id.to_string(),
        workload_metadata_resources: workloads.iter().map(to_resource).collect(),
    };

    let config = TypedExtensionConfig {
        name: FILTER_NAME.to_string(),
        typed_config: Some(to_any(WORKLOAD_METADATA_RESOURCES_TYPE_URL, &bundle)?),
    };

    Ok(Resource {
        name: FILTER_NAME.to_string(),
        resource: Some(to_any(TYPED_EXTENSION_CONFIG_TYPE_URL, &config)?),
        ..Default::default()
    })
}

fn to_resource(workload: &ClassifiedWorkload) -> WorkloadMetadataResource {
    WorkloadMetadataResource {
        ip_addresses: workload.ips.clone(),
        instance_name: workload.instance_name.clone(),
        namespace_name: workload.namespace.clone(),
        containers: workload.containers.clone(),
        workload_name: workload.workload_name.clone(),
        workload_type: WorkloadType::from(workload.kind) as i32,
        canonical_name: workload.canonical.name.clone(),
        canonical_revision: workload.canonical.revision.clone(),
    }
}

fn to_any(type_url: &str, msg: &impl Message) -> Result<Any, prost::EncodeError> {
    let mut value = Vec::with_capacity(msg.encoded_len());
    msg.encode(&mut value)?;
    Ok(Any {
        type_url: type_url.to_string(),
        value,
    })
}

impl From<WorkloadKind> for WorkloadType {
    fn from(kind: WorkloadKind) -> Self {
        match kind {
            WorkloadKind::Pod => Self::KubernetesPod,
            WorkloadKind::Deployment => Self::KubernetesDeployment,
            WorkloadKind::Job => Self::KubernetesJob,
            WorkloadKind::CronJob => Self::KubernetesCronjob,
        }
    }
}
