//! spread-filter: minimum node spread for sibling replicas.
//!
//! A scheduler filter that decides, for one pod and one candidate node,
//! whether binding there would leave the pod's owning workload controller
//! spread across fewer distinct nodes than required. It does not pick nodes,
//! score them, or write anything; it only reads the object index.
//!
//! # Components
//!
//! - **`owner`**: Owning controller from a pod's owner references
//! - **`desired`**: Controller lookup and desired replica/parallelism count
//! - **`policy`**: `min-hosts` annotation override and required host count
//! - **`census`**: Distinct nodes hosting active sibling pods
//! - **`decision`**: Admit / reject comparison
//! - **`filter`**: [`ControllerSpreadFilter`], the host-facing entry point
//!
//! # Pipeline
//!
//! ```text
//! resolve_controller(pod) ── none ──────────────────────────▶ Admit
//!   │
//!   ▼
//! fetch_controller ── lookup error (fail-open) ──────────────▶ Admit
//!   │
//!   ▼
//! policy::resolve ── desired <= 1 ───────────────────────────▶ Admit
//!   │
//!   ▼
//! census::compute ── list error (fail-closed) ───────────────▶ Error
//!   │             └─ siblings <= 1 ──────────────────────────▶ Admit
//!   ▼
//! decide(required_hosts, snapshot, candidate) ──────▶ Admit | Reject
//! ```

pub mod census;
pub mod config;
pub mod decision;
pub mod desired;
pub mod error;
pub mod filter;
pub mod owner;
pub mod policy;
pub mod status;

pub use census::PlacementSnapshot;
pub use config::FilterConfig;
pub use decision::{Verdict, decide, effective_spread};
pub use error::{FilterError, FilterResult};
pub use filter::{ControllerSpreadFilter, CycleContext, PLUGIN_NAME};
pub use owner::{ControllerRef, resolve_controller};
pub use policy::{MIN_HOSTS_ANNOTATION, SpreadPolicy};
pub use status::{Code, Status};
