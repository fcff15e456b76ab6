use crate::{
    grpc::{self, metrics::GrpcServerMetricsFamily, WorkloadMetadataGenerator},
    index::{self, Index},
    k8s::{self, watcher},
    HostWorkloads,
};
use anyhow::{bail, Result};
use clap::Parser;
use futures::prelude::*;
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use tonic::transport::Server;
use tracing::{info, info_span, instrument, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "workload-metadata",
    about = "Serves workload metadata to node proxies"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "workload_metadata=info,warn",
        env = "WORKLOAD_METADATA_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    #[clap(long, default_value = "0.0.0.0:8090")]
    grpc_addr: SocketAddr,

    /// Limits the indexed pods to those matching a label selector.
    ///
    /// By default, all pods are indexed.
    #[clap(long)]
    pod_selector: Option<String>,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            grpc_addr,
            pod_selector,
        } = self;

        let index = Index::shared();

        let mut prom = <Registry>::default();
        index::metrics::register(
            prom.sub_registry_with_prefix("workload_index"),
            index.clone(),
        );
        let grpc_metrics =
            GrpcServerMetricsFamily::register(prom.sub_registry_with_prefix("grpc_server"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        // Index all scheduled pods (or those matching the selector) by node.
        let pod_watch = match pod_selector.as_deref() {
            Some(selector) => watcher::Config::default().labels(selector),
            None => watcher::Config::default(),
        };
        let pods = runtime.watch_all::<k8s::Pod>(pod_watch);
        tokio::spawn(kubert::index::namespaced(index.clone(), pods).instrument(info_span!("pods")));

        // Run the gRPC server, serving results by looking up against the index handle.
        tokio::spawn(grpc(
            grpc_addr,
            index,
            grpc_metrics,
            runtime.shutdown_handle(),
        ));

        // Block the main thread on the shutdown signal. Once it fires, wait for the background tasks to
        // complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

#[instrument(skip_all, fields(port = %addr.port()))]
async fn grpc(
    addr: SocketAddr,
    index: index::SharedIndex,
    metrics: GrpcServerMetricsFamily,
    drain: drain::Watch,
) -> Result<()> {
    let generator = WorkloadMetadataGenerator::new(HostWorkloads::new(index));
    let svc = grpc::WorkloadMetadataServer::new(generator, metrics).svc();

    let (close_tx, close_rx) = tokio::sync::oneshot::channel();
    tokio::pin! {
        let srv = Server::builder()
            .add_service(svc)
            .serve_with_shutdown(addr, close_rx.map(|_| {}));
    }

    info!(%addr, "workload metadata gRPC server listening");
    tokio::select! {
        res = (&mut srv) => res?,
        handle = drain.signaled() => {
            let _ = close_tx.send(());
            handle.release_after(srv).await?
        }
    }
    Ok(())
}
