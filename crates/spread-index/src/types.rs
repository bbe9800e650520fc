//! Workload controller model.
//!
//! The index stores the upstream `k8s-openapi` objects as-is. The only
//! types defined here are the closed set of controller kinds the spread
//! filter understands and a tagged wrapper over the four object types.

use std::fmt;

use k8s_openapi::api::apps::v1::{ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// Namespace assumed for objects that do not declare one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Workload controller kinds recognized in pod owner references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerKind {
    ReplicaSet,
    StatefulSet,
    Job,
    CronJob,
}

impl ControllerKind {
    pub const ALL: [ControllerKind; 4] = [
        ControllerKind::ReplicaSet,
        ControllerKind::StatefulSet,
        ControllerKind::Job,
        ControllerKind::CronJob,
    ];

    /// The `kind` literal used in owner references and manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerKind::ReplicaSet => "ReplicaSet",
            ControllerKind::StatefulSet => "StatefulSet",
            ControllerKind::Job => "Job",
            ControllerKind::CronJob => "CronJob",
        }
    }

    /// Exact, case-sensitive match against a `kind` literal.
    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == kind)
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetched workload controller, one variant per [`ControllerKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerObject {
    ReplicaSet(ReplicaSet),
    StatefulSet(StatefulSet),
    Job(Job),
    CronJob(CronJob),
}

impl ControllerObject {
    pub fn kind(&self) -> ControllerKind {
        match self {
            ControllerObject::ReplicaSet(_) => ControllerKind::ReplicaSet,
            ControllerObject::StatefulSet(_) => ControllerKind::StatefulSet,
            ControllerObject::Job(_) => ControllerKind::Job,
            ControllerObject::CronJob(_) => ControllerKind::CronJob,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ControllerObject::ReplicaSet(o) => &o.metadata,
            ControllerObject::StatefulSet(o) => &o.metadata,
            ControllerObject::Job(o) => &o.metadata,
            ControllerObject::CronJob(o) => &o.metadata,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata().name.as_deref()
    }

    /// Declared namespace, or [`DEFAULT_NAMESPACE`] when unset.
    pub fn namespace(&self) -> &str {
        self.metadata()
            .namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Encode the wrapped object as JSON.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            ControllerObject::ReplicaSet(o) => serde_json::to_vec(o),
            ControllerObject::StatefulSet(o) => serde_json::to_vec(o),
            ControllerObject::Job(o) => serde_json::to_vec(o),
            ControllerObject::CronJob(o) => serde_json::to_vec(o),
        }
    }

    /// Decode a JSON-encoded object of the given kind.
    pub fn from_json(kind: ControllerKind, bytes: &[u8]) -> serde_json::Result<Self> {
        Ok(match kind {
            ControllerKind::ReplicaSet => ControllerObject::ReplicaSet(serde_json::from_slice(bytes)?),
            ControllerKind::StatefulSet => ControllerObject::StatefulSet(serde_json::from_slice(bytes)?),
            ControllerKind::Job => ControllerObject::Job(serde_json::from_slice(bytes)?),
            ControllerKind::CronJob => ControllerObject::CronJob(serde_json::from_slice(bytes)?),
        })
    }

    /// Decode an already-parsed JSON value of the given kind.
    pub fn from_value(kind: ControllerKind, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            ControllerKind::ReplicaSet => ControllerObject::ReplicaSet(serde_json::from_value(value)?),
            ControllerKind::StatefulSet => ControllerObject::StatefulSet(serde_json::from_value(value)?),
            ControllerKind::Job => ControllerObject::Job(serde_json::from_value(value)?),
            ControllerKind::CronJob => ControllerObject::CronJob(serde_json::from_value(value)?),
        })
    }
}

impl From<ReplicaSet> for ControllerObject {
    fn from(o: ReplicaSet) -> Self {
        ControllerObject::ReplicaSet(o)
    }
}

impl From<StatefulSet> for ControllerObject {
    fn from(o: StatefulSet) -> Self {
        ControllerObject::StatefulSet(o)
    }
}

impl From<Job> for ControllerObject {
    fn from(o: Job) -> Self {
        ControllerObject::Job(o)
    }
}

impl From<CronJob> for ControllerObject {
    fn from(o: CronJob) -> Self {
        ControllerObject::CronJob(o)
    }
}
