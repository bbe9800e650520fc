//! Required host count from the controller's `min-hosts` annotation.
//!
//! ```text
//! override      = annotation parsed as base-10 integer, if >= 2
//!               = default_min_hosts otherwise (absent, unparseable, < 2)
//! required_hosts = min(desired_count, override)
//! ```
//!
//! Values below 2 are rejected rather than clamped, so `"1"` behaves like a
//! missing annotation. There is no upper bound: an override above the
//! desired count simply has no further effect.

use crate::config::FilterConfig;
use crate::desired::WorkloadController;

/// Annotation read from the controller object (not the pod).
pub const MIN_HOSTS_ANNOTATION: &str = "controller-spread-scheduler/min-hosts";

/// Override used when the annotation is absent or invalid.
pub const DEFAULT_MIN_HOSTS: u32 = 2;

/// Smallest annotation value accepted as an override.
pub const MIN_OVERRIDE: u32 = 2;

/// Effective spread requirement for one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadPolicy {
    pub desired_count: u32,
    pub required_hosts: u32,
}

impl SpreadPolicy {
    /// Spreading a single replica is meaningless.
    pub fn is_trivial(&self) -> bool {
        self.desired_count <= 1
    }
}

/// Parse an annotation value, falling back to `default` when it is not an
/// integer >= 2.
pub fn parse_override(value: &str, default: u32) -> u32 {
    match value.parse::<i32>() {
        Ok(n) if n >= MIN_OVERRIDE as i32 => n as u32,
        _ => default,
    }
}

/// [`parse_override`] with the stock default of 2.
pub fn parse_min_hosts(value: &str) -> u32 {
    parse_override(value, DEFAULT_MIN_HOSTS)
}

/// Required hosts for an already-validated override value.
pub fn combine(desired_count: u32, override_value: u32) -> u32 {
    desired_count.min(override_value)
}

/// Combine a desired count with an optional annotation value.
pub fn required_hosts(desired_count: u32, annotation: Option<&str>, default: u32) -> u32 {
    let override_value = annotation.map_or(default, |v| parse_override(v, default));
    combine(desired_count, override_value)
}

/// Resolve the spread policy for a fetched controller.
pub fn resolve(controller: &dyn WorkloadController, config: &FilterConfig) -> SpreadPolicy {
    let desired_count = controller.desired_count();
    let annotation = controller.annotation(&config.annotation_key);
    SpreadPolicy {
        desired_count,
        required_hosts: required_hosts(desired_count, annotation, config.default_min_hosts),
    }
}
