//! Read-only repository seams consumed by the spread filter.
//!
//! Implementations return point-in-time snapshots which may trail the
//! cluster's source of truth. They must tolerate unsynchronized concurrent
//! readers.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;

use crate::error::IndexResult;
use crate::types::{ControllerKind, ControllerObject};

/// Lookup of workload controllers by kind, namespace and name.
#[async_trait]
pub trait ControllerRepository: Send + Sync {
    /// Fetch one controller. Absence is reported as [`IndexError::NotFound`].
    ///
    /// [`IndexError::NotFound`]: crate::IndexError::NotFound
    async fn get_controller(
        &self,
        kind: ControllerKind,
        namespace: &str,
        name: &str,
    ) -> IndexResult<ControllerObject>;
}

/// Namespace-scoped pod listing.
#[async_trait]
pub trait PodRepository: Send + Sync {
    /// List every pod in `namespace`. Never lists across namespaces.
    async fn list_pods(&self, namespace: &str) -> IndexResult<Vec<Pod>>;
}
