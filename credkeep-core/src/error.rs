//! Top-level error types for credkeep.

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::store::CredentialStoreError;

/// Top-level error type encompassing all credkeep errors.
#[derive(Debug, Error)]
pub enum CredkeepError {
    /// Error from credential store operations.
    #[error("store error: {0}")]
    Store(#[from] CredentialStoreError),

    /// Error from a persistence engine used directly.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
