//! ControllerSpreadFilter: the host-facing entry point.
//!
//! Built once with its repositories injected and then shared (`Arc`) across
//! every concurrent evaluation. It holds no mutable state, so evaluations
//! for different nodes or different pods never coordinate.

use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error};

use spread_index::types::DEFAULT_NAMESPACE;
use spread_index::{ControllerRepository, PodRepository};

use crate::config::FilterConfig;
use crate::decision::{Verdict, decide};
use crate::desired::{as_workload, fetch_controller};
use crate::error::FilterResult;
use crate::owner::resolve_controller;
use crate::status::Status;
use crate::{census, policy};

/// Registered name of the filter.
pub const PLUGIN_NAME: &str = "ControllerSpreadFilter";

/// Per-cycle limits imposed by the host.
#[derive(Debug, Clone, Default)]
pub struct CycleContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl CycleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Abort when the watched value becomes `true` (or its sender is dropped).
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Tighter of the existing deadline and `now + timeout`.
    fn bounded_by(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            let candidate = Instant::now() + timeout;
            self.deadline = Some(match self.deadline {
                Some(existing) => existing.min(candidate),
                None => candidate,
            });
        }
        self
    }
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn cancelled(cancel: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = cancel else {
        return std::future::pending().await;
    };
    // A dropped sender counts as cancellation.
    let _ = rx.wait_for(|cancelled| *cancelled).await;
}

pub struct ControllerSpreadFilter {
    config: FilterConfig,
    controllers: Arc<dyn ControllerRepository>,
    pods: Arc<dyn PodRepository>,
}

impl ControllerSpreadFilter {
    pub fn new(
        config: FilterConfig,
        controllers: Arc<dyn ControllerRepository>,
        pods: Arc<dyn PodRepository>,
    ) -> FilterResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            controllers,
            pods,
        })
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Run the filter under the host's cycle limits and the configured
    /// timeout, mapping the verdict to a host status.
    pub async fn filter(&self, ctx: &CycleContext, pod: &Pod, candidate_node: &str) -> Status {
        let ctx = ctx.clone().bounded_by(self.config.cycle_timeout());
        let verdict = tokio::select! {
            biased;
            _ = cancelled(ctx.cancel) => {
                Verdict::Error("scheduling cycle cancelled".to_string())
            }
            _ = deadline_reached(ctx.deadline) => {
                Verdict::Error("scheduling cycle deadline exceeded".to_string())
            }
            verdict = self.evaluate(pod, candidate_node) => verdict,
        };
        Status::from(verdict)
    }

    /// Evaluate one (pod, candidate node) pair without cycle limits.
    pub async fn evaluate(&self, pod: &Pod, candidate_node: &str) -> Verdict {
        let Some(controller) = resolve_controller(pod) else {
            return Verdict::Admit;
        };
        let namespace = pod.metadata.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);

        let object = match fetch_controller(self.controllers.as_ref(), &controller, namespace).await {
            Ok(object) => object,
            Err(e) => {
                // Deleted or not yet visible controllers must not block scheduling.
                error!(
                    error = %e,
                    kind = %controller.kind,
                    controller = %controller.name,
                    namespace,
                    "could not retrieve controller, admitting"
                );
                return Verdict::Admit;
            }
        };

        let spread = policy::resolve(as_workload(&object), &self.config);
        if spread.is_trivial() {
            debug!(
                controller = %controller.name,
                desired = spread.desired_count,
                "single replica controller, admitting"
            );
            return Verdict::Admit;
        }

        let snapshot = match census::compute(self.pods.as_ref(), namespace, &controller).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, namespace, "error listing pods");
                return Verdict::Error(format!("error listing pods: {e}"));
            }
        };
        if snapshot.siblings <= 1 {
            return Verdict::Admit;
        }

        let verdict = decide(spread.required_hosts, &snapshot, candidate_node);
        if let Verdict::Reject {
            required_hosts,
            observed_spread,
        } = &verdict
        {
            debug!(
                candidate_node,
                current_spread = snapshot.spread(),
                effective_spread = observed_spread,
                required_hosts,
                controller_uid = %controller.uid,
                controller_name = %controller.name,
                "rejecting node due to minimum host spread constraint"
            );
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use k8s_openapi::api::apps::v1::{ReplicaSet, ReplicaSetSpec};
    use k8s_openapi::api::core::v1::{PodSpec, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
    use spread_index::{
        ClusterIndex, ControllerKind, ControllerObject, IndexError, IndexResult,
    };

    use crate::status::Code;

    fn owned_pod(name: &str, node: Option<&str>, phase: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                owner_references: Some(vec![OwnerReference {
                    api_version: "apps/v1".to_string(),
                    kind: "ReplicaSet".to_string(),
                    name: "web".to_string(),
                    uid: "uid-web".to_string(),
                    controller: Some(true),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: node.map(str::to_string),
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                ..Default::default()
            }),
        }
    }

    fn web_replica_set(replicas: i32, min_hosts: Option<&str>) -> ControllerObject {
        ControllerObject::ReplicaSet(ReplicaSet {
            metadata: ObjectMeta {
                name: Some("web".to_string()),
                namespace: Some("default".to_string()),
                uid: Some("uid-web".to_string()),
                annotations: min_hosts.map(|v| {
                    BTreeMap::from([(policy::MIN_HOSTS_ANNOTATION.to_string(), v.to_string())])
                }),
                ..Default::default()
            },
            spec: Some(ReplicaSetSpec {
                replicas: Some(replicas),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn filter_over(index: &ClusterIndex) -> ControllerSpreadFilter {
        let index = Arc::new(index.clone());
        ControllerSpreadFilter::new(FilterConfig::default(), index.clone(), index).unwrap()
    }

    /// Controller lookups succeed; pod listing never returns.
    struct StalledPods;

    #[async_trait]
    impl PodRepository for StalledPods {
        async fn list_pods(&self, _namespace: &str) -> IndexResult<Vec<Pod>> {
            std::future::pending().await
        }
    }

    /// Every lookup fails with a non-NotFound error.
    struct BrokenControllers;

    #[async_trait]
    impl ControllerRepository for BrokenControllers {
        async fn get_controller(
            &self,
            _kind: ControllerKind,
            _namespace: &str,
            _name: &str,
        ) -> IndexResult<ControllerObject> {
            Err(IndexError::Read("disk on fire".to_string()))
        }
    }

    #[test]
    fn name_is_stable() {
        let index = ClusterIndex::open_in_memory().unwrap();
        assert_eq!(filter_over(&index).name(), "ControllerSpreadFilter");
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let index = Arc::new(ClusterIndex::open_in_memory().unwrap());
        let config = FilterConfig {
            default_min_hosts: 0,
            ..Default::default()
        };
        assert!(ControllerSpreadFilter::new(config, index.clone(), index).is_err());
    }

    #[tokio::test]
    async fn singleton_controller_admits_without_listing() {
        let index = ClusterIndex::open_in_memory().unwrap();
        index.put_controller(&web_replica_set(1, None)).unwrap();

        let filter = ControllerSpreadFilter::new(
            FilterConfig::default(),
            Arc::new(index),
            Arc::new(StalledPods),
        )
        .unwrap();

        let pod = owned_pod("web-b", None, "Pending");
        assert_eq!(filter.evaluate(&pod, "n1").await, Verdict::Admit);
    }

    #[tokio::test]
    async fn zero_replicas_admits() {
        let index = ClusterIndex::open_in_memory().unwrap();
        index.put_controller(&web_replica_set(0, Some("4"))).unwrap();
        index.put_pod(&owned_pod("web-a", Some("n1"), "Running")).unwrap();
        index.put_pod(&owned_pod("web-b", Some("n1"), "Running")).unwrap();

        let filter = filter_over(&index);
        let pod = owned_pod("web-c", None, "Pending");
        assert_eq!(filter.evaluate(&pod, "n1").await, Verdict::Admit);
    }

    #[tokio::test]
    async fn broken_controller_store_fails_open() {
        let index = ClusterIndex::open_in_memory().unwrap();
        let filter = ControllerSpreadFilter::new(
            FilterConfig::default(),
            Arc::new(BrokenControllers),
            Arc::new(index),
        )
        .unwrap();

        let pod = owned_pod("web-b", None, "Pending");
        assert_eq!(filter.evaluate(&pod, "n1").await, Verdict::Admit);
    }

    #[tokio::test]
    async fn lone_sibling_admits_even_on_same_node() {
        let index = ClusterIndex::open_in_memory().unwrap();
        index.put_controller(&web_replica_set(3, None)).unwrap();
        index.put_pod(&owned_pod("web-a", Some("n1"), "Running")).unwrap();

        let filter = filter_over(&index);
        let pod = owned_pod("web-b", None, "Pending");
        assert_eq!(filter.evaluate(&pod, "n1").await, Verdict::Admit);
    }

    #[tokio::test]
    async fn rejects_co_location_below_required_spread() {
        let index = ClusterIndex::open_in_memory().unwrap();
        index.put_controller(&web_replica_set(3, None)).unwrap();
        index.put_pod(&owned_pod("web-a", Some("n1"), "Running")).unwrap();
        // The pod being scheduled is itself a pending, unscheduled sibling.
        let pod = owned_pod("web-b", None, "Pending");
        index.put_pod(&pod).unwrap();

        let filter = filter_over(&index);
        assert_eq!(
            filter.evaluate(&pod, "n1").await,
            Verdict::Reject {
                required_hosts: 2,
                observed_spread: 1
            }
        );
        assert_eq!(filter.evaluate(&pod, "n2").await, Verdict::Admit);
    }

    #[tokio::test]
    async fn filter_maps_reject_to_unschedulable() {
        let index = ClusterIndex::open_in_memory().unwrap();
        index.put_controller(&web_replica_set(4, Some("3"))).unwrap();
        index.put_pod(&owned_pod("web-a", Some("n1"), "Running")).unwrap();
        let pod = owned_pod("web-b", None, "Pending");
        index.put_pod(&pod).unwrap();

        let filter = filter_over(&index);
        let status = filter.filter(&CycleContext::new(), &pod, "n2").await;

        assert_eq!(status.code, Code::Unschedulable);
        assert_eq!(
            status.reasons,
            vec!["must schedule across at least 3 distinct nodes".to_string()]
        );
    }

    #[tokio::test]
    async fn deadline_aborts_with_error() {
        let index = ClusterIndex::open_in_memory().unwrap();
        index.put_controller(&web_replica_set(3, None)).unwrap();
        let filter = ControllerSpreadFilter::new(
            FilterConfig::default(),
            Arc::new(index),
            Arc::new(StalledPods),
        )
        .unwrap();

        let ctx = CycleContext::new().with_timeout(Duration::from_millis(20));
        let pod = owned_pod("web-b", None, "Pending");
        let status = filter.filter(&ctx, &pod, "n1").await;

        assert_eq!(status.code, Code::Error);
        assert_eq!(status.reasons, vec!["scheduling cycle deadline exceeded".to_string()]);
    }

    #[tokio::test]
    async fn configured_timeout_applies_without_host_deadline() {
        let index = ClusterIndex::open_in_memory().unwrap();
        index.put_controller(&web_replica_set(3, None)).unwrap();
        let config = FilterConfig {
            cycle_timeout_ms: Some(20),
            ..Default::default()
        };
        let filter =
            ControllerSpreadFilter::new(config, Arc::new(index), Arc::new(StalledPods)).unwrap();

        let pod = owned_pod("web-b", None, "Pending");
        let status = filter.filter(&CycleContext::new(), &pod, "n1").await;
        assert_eq!(status.code, Code::Error);
    }

    #[tokio::test]
    async fn cancellation_aborts_with_error() {
        let index = ClusterIndex::open_in_memory().unwrap();
        index.put_controller(&web_replica_set(3, None)).unwrap();
        let filter = ControllerSpreadFilter::new(
            FilterConfig::default(),
            Arc::new(index),
            Arc::new(StalledPods),
        )
        .unwrap();

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let ctx = CycleContext::new().with_cancel(cancel_rx);
        let pod = owned_pod("web-b", None, "Pending");

        let (status, _) = tokio::join!(filter.filter(&ctx, &pod, "n1"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel_tx.send(true).unwrap();
        });

        assert_eq!(status.code, Code::Error);
        assert_eq!(status.reasons, vec!["scheduling cycle cancelled".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_evaluations_agree() {
        let index = ClusterIndex::open_in_memory().unwrap();
        index.put_controller(&web_replica_set(3, None)).unwrap();
        index.put_pod(&owned_pod("web-a", Some("n1"), "Running")).unwrap();
        let pod = owned_pod("web-b", None, "Pending");
        index.put_pod(&pod).unwrap();

        let filter = Arc::new(filter_over(&index));
        let pod = Arc::new(pod);
        let mut handles = Vec::new();
        for i in 0..16 {
            let filter = filter.clone();
            let pod = pod.clone();
            let node = if i % 2 == 0 { "n1" } else { "n2" };
            handles.push(tokio::spawn(async move {
                (node, filter.evaluate(&pod, node).await)
            }));
        }

        for handle in handles {
            let (node, verdict) = handle.await.unwrap();
            assert_eq!(verdict.is_admit(), node == "n2");
        }
    }
}
