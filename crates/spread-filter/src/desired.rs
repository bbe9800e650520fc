//! Controller lookup and desired replica/parallelism count.
//!
//! Each workload kind exposes its desired concurrent pod count through a
//! different field. [`WorkloadController`] hides that behind one capability
//! so the rest of the pipeline never branches on kind.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use spread_index::{ControllerObject, ControllerRepository, IndexResult};

use crate::owner::ControllerRef;

/// Desired count assumed when a controller leaves the field unset.
pub const DEFAULT_DESIRED_COUNT: u32 = 1;

/// Read-only view over a workload controller.
pub trait WorkloadController {
    fn metadata(&self) -> &ObjectMeta;

    /// The kind-specific count field, if set.
    fn desired_field(&self) -> Option<i32>;

    /// Desired concurrent pods. Unset means 1; negative values clamp to 0.
    fn desired_count(&self) -> u32 {
        match self.desired_field() {
            Some(n) => u32::try_from(n).unwrap_or(0),
            None => DEFAULT_DESIRED_COUNT,
        }
    }

    /// Annotation lookup; absent annotations behave as an empty mapping.
    fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata()
            .annotations
            .as_ref()
            .and_then(|a: &BTreeMap<String, String>| a.get(key))
            .map(String::as_str)
    }
}

impl WorkloadController for ReplicaSet {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn desired_field(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.replicas)
    }
}

impl WorkloadController for StatefulSet {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn desired_field(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.replicas)
    }
}

impl WorkloadController for Job {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn desired_field(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.parallelism)
    }
}

impl WorkloadController for CronJob {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    // spec.jobTemplate.spec.parallelism
    fn desired_field(&self) -> Option<i32> {
        self.spec
            .as_ref()
            .and_then(|s| s.job_template.spec.as_ref())
            .and_then(|s| s.parallelism)
    }
}

/// Borrow the fetched object through its kind's capability.
pub fn as_workload(obj: &ControllerObject) -> &dyn WorkloadController {
    match obj {
        ControllerObject::ReplicaSet(o) => o,
        ControllerObject::StatefulSet(o) => o,
        ControllerObject::Job(o) => o,
        ControllerObject::CronJob(o) => o,
    }
}

/// Fetch the controller named by `controller` from `namespace`.
///
/// Errors are returned as-is; the filter treats every lookup failure as
/// fail-open.
pub async fn fetch_controller(
    repo: &dyn ControllerRepository,
    controller: &ControllerRef,
    namespace: &str,
) -> IndexResult<ControllerObject> {
    repo.get_controller(controller.kind, namespace, &controller.name)
        .await
}
