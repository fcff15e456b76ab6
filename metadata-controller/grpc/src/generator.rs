use crate::{encode, proto::discovery};
use tracing::{debug, trace};
use workload_metadata_controller_core::{
    classify, ClassifiedWorkload, DiscoverHostWorkloads, ResolveCanonicalService, WellKnownLabels,
    Workload,
};


pub type Resources = Vec<discovery::Resource>;

/// The proxy a configuration is being generated for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyContext {
    pub id: String,

    /// The name of the node hosting the proxy. Workloads on this node are reported.
    pub node_name: String,
}

/// The resource subscription being served.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchedResource {
    pub type_url: String,
    pub resource_names: Vec<String>,
}

/// Describes why a configuration is being generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushRequest {
    pub full: bool,
    pub reason: PushReason,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PushReason {
    /// The proxy asked for its configuration.
    ProxyRequest,
}

/// Summary information about a generated configuration, for logging.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogDetails {
    pub incremental: bool,
    pub additional_info: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to encode workload metadata: {0}")]
    Encode(#[from] prost::EncodeError),
}

/// Produces discovery resources for a proxy.
pub trait Generator {
    fn generate(
        &self,
        proxy: &ProxyContext,
        watched: &WatchedResource,
        push: &PushRequest,
    ) -> Result<(Resources, LogDetails), Error>;
}

/// Generates the workload metadata bundle for the node hosting a proxy.
#[derive(Clone, Debug)]
pub struct WorkloadMetadataGenerator<D, C = WellKnownLabels> {
    workloads: D,
    canonical: C,
}

// === impl PushRequest ===

impl PushRequest {
    /// A full push in response to a proxy's request.
    pub fn proxy_request() -> Self {
        Self {
            full: true,
            reason: PushReason::ProxyRequest,
        }
    }
}

// === impl WorkloadMetadataGenerator ===

impl<D> WorkloadMetadataGenerator<D> {
    pub fn new(workloads: D) -> Self {
        Self::with_canonical_services(workloads, WellKnownLabels::default())
    }
}

impl<D, C> WorkloadMetadataGenerator<D, C> {
    pub fn with_canonical_services(workloads: D, canonical: C) -> Self {
        Self {
            workloads,
            canonical,
        }
    }
}

impl<D, C> WorkloadMetadataGenerator<D, C>
where
    C: ResolveCanonicalService,
{
    fn classify(&self, workload: &Workload) -> ClassifiedWorkload {
        let (workload_name, kind) = classify(workload);
        trace!(
            instance = %workload.name,
            workload = workload_name,
            %kind,
            "Classified workload",
        );
        let canonical = self
            .canonical
            .canonical_service(&workload.labels, workload_name);
        ClassifiedWorkload {
            workload_name: workload_name.to_string(),
            kind,
            instance_name: workload.name.clone(),
            namespace: workload.namespace.clone(),
            ips: workload.ips.clone(),
            containers: workload.containers.clone(),
            canonical,
        }
    }
}

impl<D, C> Generator for WorkloadMetadataGenerator<D, C>
where
    D: DiscoverHostWorkloads,
    C: ResolveCanonicalService,
{
    fn generate(
        &self,
        proxy: &ProxyContext,
        _watched: &WatchedResource,
        _push: &PushRequest,
    ) -> Result<(Resources, LogDetails), Error> {
        let workloads = self
            .workloads
            .workloads_on_host(&proxy.node_name)
            .iter()
            .map(|w| self.classify(w))
            .collect::<Vec<_>>();
        debug!(
            proxy = %proxy.id,
            node = %proxy.node_name,
            workloads = workloads.len(),
            "Generated workload metadata",
        );

        let resource = encode::encode(&proxy.id, &workloads)?;
        let details = LogDetails {
            incremental: false,
            additional_info: format!("workloads:{}", workloads.len()),
        };
        Ok((vec![resource], details))
    }
}
