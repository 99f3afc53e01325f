//! Error types for board configuration and tuning

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, PlinkoError>;

/// Configuration errors. Nothing in a running simulation is fatal; these are
/// only returned when a host asks for a board or tuning that cannot work.
#[derive(Debug, Error)]
pub enum PlinkoError {
    /// Row count outside `1..=MAX_ROWS`
    #[error("invalid row count: {0} (must be between 1 and 64)")]
    InvalidRowCount(u32),

    /// Board dimensions must be positive and finite
    #[error("invalid board dimensions: {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },

    /// A tuning parameter is out of its usable range
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Risk tier name not recognised
    #[error("unknown risk tier: {0}")]
    UnknownRiskTier(String),

    /// Config JSON could not be parsed
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlinkoError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
