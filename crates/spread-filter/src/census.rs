//! Placement census of a controller's active sibling pods.
//!
//! Only `Pending` and `Running` pods count: finished or unknown pods do not
//! occupy a node for availability purposes. Unscheduled siblings add to the
//! sibling count but not to the node set.

use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::Pod;

use spread_index::{IndexResult, PodRepository};

use crate::owner::{ControllerRef, is_owned_by};

const PHASE_PENDING: &str = "Pending";
const PHASE_RUNNING: &str = "Running";

/// Point-in-time view of where a controller's active pods sit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementSnapshot {
    /// Active sibling pods, scheduled or not.
    pub siblings: usize,
    /// Distinct nodes hosting at least one active sibling.
    pub nodes: BTreeSet<String>,
}

impl PlacementSnapshot {
    /// Build a snapshot directly from node names (for callers that already
    /// know the placement).
    pub fn from_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes: BTreeSet<String> = nodes.into_iter().map(Into::into).collect();
        Self {
            siblings: nodes.len(),
            nodes,
        }
    }

    pub fn spread(&self) -> usize {
        self.nodes.len()
    }

    pub fn hosts(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }
}

/// Whether a pod's phase counts toward spread.
pub fn is_active(pod: &Pod) -> bool {
    matches!(
        pod.status.as_ref().and_then(|s| s.phase.as_deref()),
        Some(PHASE_PENDING | PHASE_RUNNING)
    )
}

fn node_name(pod: &Pod) -> Option<&str> {
    pod.spec
        .as_ref()
        .and_then(|s| s.node_name.as_deref())
        .filter(|n| !n.is_empty())
}

/// Fold already-listed pods into a snapshot for `controller`.
pub fn tally<'a, I>(pods: I, controller: &ControllerRef) -> PlacementSnapshot
where
    I: IntoIterator<Item = &'a Pod>,
{
    let mut snapshot = PlacementSnapshot::default();
    for pod in pods {
        if !is_owned_by(pod, controller) || !is_active(pod) {
            continue;
        }
        snapshot.siblings += 1;
        if let Some(node) = node_name(pod) {
            snapshot.nodes.insert(node.to_string());
        }
    }
    snapshot
}

/// List `namespace` and compute the placement of `controller`'s siblings.
///
/// Listing errors are returned to the caller; the filter treats them as
/// fail-closed.
pub async fn compute(
    repo: &dyn PodRepository,
    namespace: &str,
    controller: &ControllerRef,
) -> IndexResult<PlacementSnapshot> {
    let pods = repo.list_pods(namespace).await?;
    Ok(tally(&pods, controller))
}
