use crate::{generator::ProxyContext, proto::config::Node};
use prost_types::value::Kind;

/// The node metadata field holding the name of the Kubernetes node that hosts the proxy.
pub const NODE_NAME_METADATA: &str = "NODE_NAME";

impl TryFrom<&Node> for ProxyContext {
    type Error = tonic::Status;

    fn try_from(node: &Node) -> Result<Self, tonic::Status> {
        if node.id.is_empty() {
            return Err(tonic::Status::invalid_argument("Node ID must be set"));
        }

        let node_name = node
            .metadata
            .as_ref()
            .and_then(|md| md.fields.get(NODE_NAME_METADATA))
            .and_then(|v| match v.kind.as_ref()? {
                Kind::StringValue(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .ok_or_else(|| {
                tracing::warn!(node.id = %node.id, "Node metadata is missing {NODE_NAME_METADATA}");
                tonic::Status::invalid_argument(format!(
                    "Invalid node {}: metadata must include {NODE_NAME_METADATA}",
                    node.id
                ))
            })?;

        Ok(ProxyContext {
            id: node.id.clone(),
            node_name,
        })
    }
}
