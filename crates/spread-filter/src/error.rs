//! Filter error types.

use thiserror::Error;

/// Errors raised while building a filter.
///
/// Per-pod evaluation never fails with this type: store failures and
/// cancellation are reported through [`Verdict::Error`](crate::Verdict::Error).
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid filter config: {0}")]
    Config(String),

    #[error("failed to parse filter config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read filter config: {0}")]
    Io(#[from] std::io::Error),
}

pub type FilterResult<T> = Result<T, FilterError>;
