use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, histogram::Histogram},
    registry::{Registry, Unit},
};
use tokio::time;

/// Server-side gRPC metrics, labeled by service and method.
#[derive(Clone, Debug)]
pub struct GrpcServerMetricsFamily {
    started: Family<RpcLabels, Counter>,
    handling: Family<RpcLabels, Histogram>,
    handled: Family<CodeLabels, Counter>,
    msg_received: Family<RpcLabels, Counter>,
    msg_sent: Family<RpcLabels, Counter>,
}

/// Metrics for a single unary method.
#[derive(Clone, Debug)]
pub(crate) struct UnaryRpcMetrics {
    started: Counter,
    msg_received: Counter,
    msg_sent: Counter,
    handling: Histogram,
    handled: Family<CodeLabels, Counter>,
    labels: RpcLabels,
}

/// Tracks one in-flight call. A call that is dropped before it is ended is counted as
/// cancelled.
pub(crate) struct CallObserver {
    start: time::Instant,
    msg_sent: Counter,
    handling: Histogram,
    handled: Family<CodeLabels, Counter>,
    labels: RpcLabels,
    ended: bool,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct RpcLabels {
    grpc_service: &'static str,
    grpc_method: &'static str,
    grpc_type: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct CodeLabels {
    grpc_service: &'static str,
    grpc_method: &'static str,
    grpc_type: &'static str,
    grpc_code: &'static str,
}

// === impl GrpcServerMetricsFamily ===

impl GrpcServerMetricsFamily {
    pub fn register(reg: &mut Registry) -> Self {
        let started = Family::<RpcLabels, Counter>::default();
        reg.register(
            "started",
            "Total number of RPCs started on the server",
            started.clone(),
        );

        let msg_received = Family::<RpcLabels, Counter>::default();
        reg.register(
            "msg_received",
            "Total number of RPC messages received on the server",
            msg_received.clone(),
        );

        let msg_sent = Family::<RpcLabels, Counter>::default();
        reg.register(
            "msg_sent",
            "Total number of RPC messages sent by the server",
            msg_sent.clone(),
        );

        let handled = Family::<CodeLabels, Counter>::default();
        reg.register(
            "handled",
            "Total number of RPCs completed on the server, regardless of success or failure",
            handled.clone(),
        );

        // Fetches are answered from memory, so latency is expected to be well under a second.
        let handling = Family::<RpcLabels, Histogram>::new_with_constructor(|| {
            Histogram::new([0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0])
        });
        reg.register_with_unit(
            "handling",
            "Histogram of response latency (seconds) of RPCs handled by the server",
            Unit::Seconds,
            handling.clone(),
        );

        Self {
            started,
            handling,
            handled,
            msg_received,
            msg_sent,
        }
    }

    pub(crate) fn unary_rpc(
        &self,
        grpc_service: &'static str,
        grpc_method: &'static str,
    ) -> UnaryRpcMetrics {
        let labels = RpcLabels {
            grpc_service,
            grpc_method,
            grpc_type: "unary",
        };
        UnaryRpcMetrics {
            started: self.started.get_or_create(&labels).clone(),
            msg_received: self.msg_received.get_or_create(&labels).clone(),
            msg_sent: self.msg_sent.get_or_create(&labels).clone(),
            handling: self.handling.get_or_create(&labels).clone(),
            handled: self.handled.clone(),
            labels,
        }
    }
}

// === impl UnaryRpcMetrics ===

impl UnaryRpcMetrics {
    pub(crate) fn start(&self) -> CallObserver {
        self.started.inc();
        self.msg_received.inc();

        // Pre-register OK so that the series exists before the first call completes.
        let _ = self
            .handled
            .get_or_create(&self.labels.with_code(tonic::Code::Ok));

        CallObserver {
            start: time::Instant::now(),
            msg_sent: self.msg_sent.clone(),
            handling: self.handling.clone(),
            handled: self.handled.clone(),
            labels: self.labels.clone(),
            ended: false,
        }
    }
}

// === impl CallObserver ===

impl CallObserver {
    pub(crate) fn msg_sent(&self) {
        self.msg_sent.inc();
    }

    pub(crate) fn end(mut self, code: tonic::Code) {
        self.record(code);
    }

    fn record(&mut self, code: tonic::Code) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.handling.observe(self.start.elapsed().as_secs_f64());
        self.handled
            .get_or_create(&self.labels.with_code(code))
            .inc();
    }
}

impl Drop for CallObserver {
    fn drop(&mut self) {
        self.record(tonic::Code::Cancelled);
    }
}

// === impl RpcLabels ===

impl RpcLabels {
    fn with_code(&self, code: tonic::Code) -> CodeLabels {
        CodeLabels {
            grpc_service: self.grpc_service,
            grpc_method: self.grpc_method,
            grpc_type: self.grpc_type,
            grpc_code: code_str(code),
        }
    }
}

fn code_str(code: tonic::Code) -> &'static str {
    use tonic::Code::*;
    match code {
        Ok => "OK",
        Cancelled => "CANCELLED",
        Unknown => "UNKNOWN",
        InvalidArgument => "INVALID_ARGUMENT",
        DeadlineExceeded => "DEADLINE_EXCEEDED",
        NotFound => "NOT_FOUND",
        AlreadyExists => "ALREADY_EXISTS",
        PermissionDenied => "PERMISSION_DENIED",
        ResourceExhausted => "RESOURCE_EXHAUSTED",
        FailedPrecondition => "FAILED_PRECONDITION",
        Aborted => "ABORTED",
        OutOfRange => "OUT_OF_RANGE",
        Unimplemented => "UNIMPLEMENTED",
        Internal => "INTERNAL",
        Unavailable => "UNAVAILABLE",
        DataLoss => "DATA_LOSS",
        Unauthenticated => "UNAUTHENTICATED",
    }
}
