//! Filter configuration (TOML).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::policy::{DEFAULT_MIN_HOSTS, MIN_HOSTS_ANNOTATION, MIN_OVERRIDE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Controller annotation carrying the minimum host override.
    pub annotation_key: String,
    /// Required host count when the annotation is absent or invalid.
    pub default_min_hosts: u32,
    /// Upper bound on one evaluation, in milliseconds.
    pub cycle_timeout_ms: Option<u64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            annotation_key: MIN_HOSTS_ANNOTATION.to_string(),
            default_min_hosts: DEFAULT_MIN_HOSTS,
            cycle_timeout_ms: None,
        }
    }
}

impl FilterConfig {
    pub fn from_file(path: &Path) -> FilterResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> FilterResult<Self> {
        let config: FilterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FilterResult<()> {
        if self.annotation_key.trim().is_empty() {
            return Err(FilterError::Config("annotation_key must not be empty".to_string()));
        }
        if self.default_min_hosts < MIN_OVERRIDE {
            return Err(FilterError::Config(format!(
                "default_min_hosts must be at least {MIN_OVERRIDE}, got {}",
                self.default_min_hosts
            )));
        }
        if self.cycle_timeout_ms == Some(0) {
            return Err(FilterError::Config("cycle_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn cycle_timeout(&self) -> Option<Duration> {
        self.cycle_timeout_ms.map(Duration::from_millis)
    }
}
