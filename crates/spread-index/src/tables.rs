//! redb table definitions for the object index.
//!
//! Every table uses `&str` keys of the form `{namespace}/{name}` and `&[u8]`
//! values holding the JSON-encoded Kubernetes object.

use redb::TableDefinition;

use crate::types::ControllerKind;

/// Pods.
pub const PODS: TableDefinition<&str, &[u8]> = TableDefinition::new("pods");

/// `apps/v1` ReplicaSets.
pub const REPLICA_SETS: TableDefinition<&str, &[u8]> = TableDefinition::new("replica_sets");

/// `apps/v1` StatefulSets.
pub const STATEFUL_SETS: TableDefinition<&str, &[u8]> = TableDefinition::new("stateful_sets");

/// `batch/v1` Jobs.
pub const JOBS: TableDefinition<&str, &[u8]> = TableDefinition::new("jobs");

/// `batch/v1` CronJobs.
pub const CRON_JOBS: TableDefinition<&str, &[u8]> = TableDefinition::new("cron_jobs");

/// Table holding controllers of the given kind.
pub fn controller_table(kind: ControllerKind) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match kind {
        ControllerKind::ReplicaSet => REPLICA_SETS,
        ControllerKind::StatefulSet => STATEFUL_SETS,
        ControllerKind::Job => JOBS,
        ControllerKind::CronJob => CRON_JOBS,
    }
}

/// Composite key for a namespaced object.
pub fn object_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// Key prefix matching every object in `namespace` and nothing else.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}/")
}
