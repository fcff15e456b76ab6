use crate::{
    encode::TYPED_EXTENSION_CONFIG_TYPE_URL,
    generator::{Generator, ProxyContext, PushRequest, WatchedResource},
    metrics::{GrpcServerMetricsFamily, UnaryRpcMetrics},
    proto::{
        discovery::{DiscoveryRequest, DiscoveryResponse},
        workload_metadata::workload_metadata_discovery_service_server::{
            WorkloadMetadataDiscoveryService, WorkloadMetadataDiscoveryServiceServer,
        },
    },
};
use tonic::server::NamedService;
use tracing::{debug, error, instrument};

/// Serves each proxy the workload metadata for its node.
///
/// Every fetch is answered with a full push of the node's current workloads.
#[derive(Clone, Debug)]
pub struct WorkloadMetadataServer<G> {
    generator: G,
    metrics: UnaryRpcMetrics,
}

// === impl WorkloadMetadataServer ===

impl<G> WorkloadMetadataServer<G>
where
    G: Generator + Send + Sync + 'static,
{
    pub fn new(generator: G, metrics: GrpcServerMetricsFamily) -> Self {
        Self {
            generator,
            metrics: metrics.unary_rpc(
                WorkloadMetadataDiscoveryServiceServer::<Self>::NAME,
                "FetchWorkloadMetadata",
            ),
        }
    }

    pub fn svc(self) -> WorkloadMetadataDiscoveryServiceServer<Self> {
        WorkloadMetadataDiscoveryServiceServer::new(self)
    }

    fn fetch(&self, req: DiscoveryRequest) -> Result<DiscoveryResponse, tonic::Status> {
        let node = req
            .node
            .as_ref()
            .ok_or_else(|| tonic::Status::invalid_argument("Discovery request must include a node"))?;
        let proxy = ProxyContext::try_from(node)?;

        let watched = WatchedResource {
            type_url: req.type_url,
            resource_names: req.resource_names,
        };
        let (resources, details) = self
            .generator
            .generate(&proxy, &watched, &PushRequest::proxy_request())
            .map_err(|error| {
                error!(%error, proxy = %proxy.id, "Failed to generate workload metadata");
                tonic::Status::internal(format!("failed to generate workload metadata: {error}"))
            })?;
        debug!(
            proxy = %proxy.id,
            node = %proxy.node_name,
            incremental = details.incremental,
            details = %details.additional_info,
            "Pushing workload metadata",
        );

        Ok(DiscoveryResponse {
            resources: resources.into_iter().filter_map(|r| r.resource).collect(),
            type_url: TYPED_EXTENSION_CONFIG_TYPE_URL.to_string(),
            ..Default::default()
        })
    }
}

#[async_trait::async_trait]
impl<G> WorkloadMetadataDiscoveryService for WorkloadMetadataServer<G>
where
    G: Generator + Send + Sync + 'static,
{
    #[instrument(skip_all)]
    async fn fetch_workload_metadata(
        &self,
        req: tonic::Request<DiscoveryRequest>,
    ) -> Result<tonic::Response<DiscoveryResponse>, tonic::Status> {
        let call = self.metrics.start();
        match self.fetch(req.into_inner()) {
            Ok(rsp) => {
                call.msg_sent();
                call.end(tonic::Code::Ok);
                Ok(tonic::Response::new(rsp))
            }
            Err(status) => {
                call.end(status.code());
                Err(status)
            }
        }
    }
}
