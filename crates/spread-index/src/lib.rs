//! spread-index: read-only object index for the controller spread filter.
//!
//! The filter never talks to an API server. It reads point-in-time
//! snapshots of pods and workload controllers through two repository
//! traits, and this crate provides both the traits and a redb-backed
//! implementation ([`ClusterIndex`]) used by the `spreadd` harness and the
//! test suites.
//!
//! # Architecture
//!
//! ```text
//! ControllerRepository ─┐
//!                       ├── ClusterIndex (redb, Arc<Database>)
//! PodRepository ────────┘     ├── pods           {namespace}/{name}
//!                             ├── replica_sets   {namespace}/{name}
//!                             ├── stateful_sets  {namespace}/{name}
//!                             ├── jobs           {namespace}/{name}
//!                             └── cron_jobs      {namespace}/{name}
//! ```
//!
//! Values are the JSON encoding of the `k8s-openapi` object. Reads may be
//! stale relative to the cluster; callers must not assume read-your-writes.

pub mod error;
pub mod repository;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{IndexError, IndexResult};
pub use repository::{ControllerRepository, PodRepository};
pub use store::{ClusterIndex, ImportSummary};
pub use types::{ControllerKind, ControllerObject};
