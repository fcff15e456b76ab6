use crate::SharedIndex;
use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeMetric},
    metrics::{gauge::ConstGauge, MetricType},
    registry::Registry,
};

#[derive(Debug)]
struct Instrumented(SharedIndex);

/// Registers gauges describing the index's contents.
pub fn register(reg: &mut Registry, index: SharedIndex) {
    reg.register_collector(Box::new(Instrumented(index)));
}

impl Collector for Instrumented {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> Result<(), std::fmt::Error> {
        let index = self.0.read();

        let nodes = ConstGauge::new(index.node_sizes().count() as i64);
        let nodes_encoder = encoder.encode_descriptor(
            "nodes",
            "The number of nodes with indexed workloads",
            None,
            MetricType::Gauge,
        )?;
        nodes.encode(nodes_encoder)?;

        let mut workloads_encoder = encoder.encode_descriptor(
            "workloads",
            "The number of workloads in index",
            None,
            MetricType::Gauge,
        )?;
        for (node, size) in index.node_sizes() {
            let labels = [("node", node)];
            let workloads = ConstGauge::new(size as i64);
            let workloads_encoder = workloads_encoder.encode_family(&labels)?;
            workloads.encode(workloads_encoder)?;
        }

        Ok(())
    }
}
