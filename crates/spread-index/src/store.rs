//! ClusterIndex: redb-backed snapshot of pods and workload controllers.
//!
//! Provides typed put/get/list/delete over the five object tables and
//! implements the [`ControllerRepository`] and [`PodRepository`] seams. All
//! values are JSON-serialized `k8s-openapi` objects. The index supports
//! both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::repository::{ControllerRepository, PodRepository};
use crate::tables::*;
use crate::types::{ControllerKind, ControllerObject, DEFAULT_NAMESPACE};

/// Convert any `Display` error into an `IndexError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| IndexError::$variant(e.to_string())
    };
}

type ObjectTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Counts produced by [`ClusterIndex::import_manifest`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub pods: u32,
    pub controllers: u32,
    /// Items whose kind the index does not store.
    pub skipped: u32,
}

/// Thread-safe object index backed by redb.
#[derive(Clone)]
pub struct ClusterIndex {
    db: Arc<Database>,
}

impl ClusterIndex {
    /// Open (or create) a persistent index at the given path.
    pub fn open(path: &Path) -> IndexResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let index = Self { db: Arc::new(db) };
        index.ensure_tables()?;
        debug!(?path, "cluster index opened");
        Ok(index)
    }

    /// Create an ephemeral in-memory index (for testing).
    pub fn open_in_memory() -> IndexResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let index = Self { db: Arc::new(db) };
        index.ensure_tables()?;
        debug!("in-memory cluster index opened");
        Ok(index)
    }

    fn ensure_tables(&self) -> IndexResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(PODS).map_err(map_err!(Table))?;
        for kind in ControllerKind::ALL {
            txn.open_table(controller_table(kind)).map_err(map_err!(Table))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Pods ───────────────────────────────────────────────────────

    /// Insert or update a pod.
    pub fn put_pod(&self, pod: &Pod) -> IndexResult<()> {
        let name = pod
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| IndexError::InvalidObject("pod has no metadata.name".to_string()))?;
        let namespace = pod.metadata.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        let key = object_key(namespace, name);
        let value = serde_json::to_vec(pod).map_err(map_err!(Serialize))?;
        self.put_raw(PODS, &key, &value)?;
        debug!(%key, "pod stored");
        Ok(())
    }

    /// Get a pod by namespace and name.
    pub fn get_pod(&self, namespace: &str, name: &str) -> IndexResult<Option<Pod>> {
        match self.get_raw(PODS, &object_key(namespace, name))? {
            Some(bytes) => {
                let pod = serde_json::from_slice(&bytes).map_err(map_err!(Deserialize))?;
                Ok(Some(pod))
            }
            None => Ok(None),
        }
    }

    /// List all pods in a namespace.
    pub fn list_pods_in(&self, namespace: &str) -> IndexResult<Vec<Pod>> {
        self.list_raw(PODS, &namespace_prefix(namespace))?
            .iter()
            .map(|bytes| serde_json::from_slice(bytes).map_err(map_err!(Deserialize)))
            .collect()
    }

    /// Delete a pod. Returns true if it existed.
    pub fn delete_pod(&self, namespace: &str, name: &str) -> IndexResult<bool> {
        self.delete_raw(PODS, &object_key(namespace, name))
    }

    // ── Controllers ────────────────────────────────────────────────

    /// Insert or update a workload controller.
    pub fn put_controller(&self, controller: &ControllerObject) -> IndexResult<()> {
        let name = controller.name().ok_or_else(|| {
            IndexError::InvalidObject(format!("{} has no metadata.name", controller.kind()))
        })?;
        let key = object_key(controller.namespace(), name);
        let value = controller.to_json().map_err(map_err!(Serialize))?;
        self.put_raw(controller_table(controller.kind()), &key, &value)?;
        debug!(kind = %controller.kind(), %key, "controller stored");
        Ok(())
    }

    /// Get a controller by kind, namespace and name.
    pub fn find_controller(
        &self,
        kind: ControllerKind,
        namespace: &str,
        name: &str,
    ) -> IndexResult<Option<ControllerObject>> {
        match self.get_raw(controller_table(kind), &object_key(namespace, name))? {
            Some(bytes) => {
                let obj = ControllerObject::from_json(kind, &bytes).map_err(map_err!(Deserialize))?;
                Ok(Some(obj))
            }
            None => Ok(None),
        }
    }

    /// Delete a controller. Returns true if it existed.
    pub fn delete_controller(
        &self,
        kind: ControllerKind,
        namespace: &str,
        name: &str,
    ) -> IndexResult<bool> {
        self.delete_raw(controller_table(kind), &object_key(namespace, name))
    }

    // ── Manifests ──────────────────────────────────────────────────

    /// Load objects from a JSON manifest.
    ///
    /// Accepts a bare array of objects, a `kind: List` object with `items`,
    /// or a single object. Each item is dispatched on its `kind`; kinds the
    /// index does not store are counted as skipped.
    pub fn import_manifest(&self, json: &[u8]) -> IndexResult<ImportSummary> {
        let doc: serde_json::Value = serde_json::from_slice(json).map_err(map_err!(Deserialize))?;
        let items = match doc {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(mut obj) => match obj.remove("items") {
                Some(serde_json::Value::Array(items)) => items,
                _ => vec![serde_json::Value::Object(obj)],
            },
            other => {
                return Err(IndexError::InvalidObject(format!(
                    "manifest must be an object or array, got {other}"
                )));
            }
        };

        let mut summary = ImportSummary::default();
        for item in items {
            let kind = item
                .get("kind")
                .and_then(|k| k.as_str())
                .unwrap_or_default()
                .to_string();

            if kind == "Pod" {
                let pod: Pod = serde_json::from_value(item).map_err(map_err!(Deserialize))?;
                self.put_pod(&pod)?;
                summary.pods += 1;
            } else if let Some(controller_kind) = ControllerKind::from_kind(&kind) {
                let obj = ControllerObject::from_value(controller_kind, item)
                    .map_err(map_err!(Deserialize))?;
                self.put_controller(&obj)?;
                summary.controllers += 1;
            } else {
                debug!(%kind, "skipping manifest item of unindexed kind");
                summary.skipped += 1;
            }
        }

        debug!(
            pods = summary.pods,
            controllers = summary.controllers,
            skipped = summary.skipped,
            "manifest imported"
        );
        Ok(summary)
    }

    // ── Raw table access ───────────────────────────────────────────

    fn put_raw(&self, def: ObjectTable, key: &str, value: &[u8]) -> IndexResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(def).map_err(map_err!(Table))?;
            table.insert(key, value).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get_raw(&self, def: ObjectTable, key: &str) -> IndexResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(def).map_err(map_err!(Table))?;
        let value = table
            .get(key)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn list_raw(&self, def: ObjectTable, prefix: &str) -> IndexResult<Vec<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(def).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(prefix) {
                results.push(value.value().to_vec());
            }
        }
        Ok(results)
    }

    fn delete_raw(&self, def: ObjectTable, key: &str) -> IndexResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(def).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "object deleted");
        Ok(existed)
    }
}

#[async_trait]
impl ControllerRepository for ClusterIndex {
    async fn get_controller(
        &self,
        kind: ControllerKind,
        namespace: &str,
        name: &str,
    ) -> IndexResult<ControllerObject> {
        self.find_controller(kind, namespace, name)?
            .ok_or_else(|| IndexError::NotFound(format!("{kind} {}", object_key(namespace, name))))
    }
}

#[async_trait]
impl PodRepository for ClusterIndex {
    async fn list_pods(&self, namespace: &str) -> IndexResult<Vec<Pod>> {
        self.list_pods_in(namespace)
    }
}
