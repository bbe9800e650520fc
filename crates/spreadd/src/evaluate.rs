//! Fan out one pod's filter evaluation across candidate nodes.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use serde::Serialize;
use spread_filter::{Code, ControllerSpreadFilter, CycleContext};
use tracing::debug;

/// Filter result for one candidate node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeResult {
    pub node: String,
    pub code: Code,
    pub reasons: Vec<String>,
}

/// Evaluate every node concurrently; results keep the input order.
pub async fn evaluate_nodes(
    filter: Arc<ControllerSpreadFilter>,
    ctx: CycleContext,
    pod: Arc<Pod>,
    nodes: Vec<String>,
) -> anyhow::Result<Vec<NodeResult>> {
    let handles: Vec<_> = nodes
        .into_iter()
        .map(|node| {
            let filter = filter.clone();
            let ctx = ctx.clone();
            let pod = pod.clone();
            tokio::spawn(async move {
                let status = filter.filter(&ctx, &pod, &node).await;
                debug!(%node, code = %status.code, "node evaluated");
                NodeResult {
                    node,
                    code: status.code,
                    reasons: status.reasons,
                }
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await?);
    }
    Ok(results)
}
