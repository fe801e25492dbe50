/*!
 * Error Types
 * Centralized error handling with thiserror and serde support
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Construction-time configuration errors
///
/// Executors validate their dimensions synchronously; a zero worker count,
/// domain size, or batch size never reaches a worker thread.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("domain size must be positive")]
    ZeroDomain,

    #[error("worker count must be positive")]
    ZeroWorkers,

    #[error("batch size must be positive")]
    ZeroBatchSize,
}

/// Strategy selection errors, surfaced by callers that parse strategy names
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum StrategyError {
    #[error("unknown strategy: {0}")]
    Unknown(String),
}

/// Validate common executor dimensions
pub(crate) fn check_dimensions(n: usize, workers: usize) -> Result<(), ConfigError> {
    if n == 0 {
        return Err(ConfigError::ZeroDomain);
    }
    if workers == 0 {
        return Err(ConfigError::ZeroWorkers);
    }
    Ok(())
}
