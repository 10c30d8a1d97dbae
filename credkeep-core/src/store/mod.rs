//! Credential storage.
//!
//! This module provides:
//! - [`CredentialStore`] - The store/load/delete interface application code uses
//! - [`PersistentCredentialStore`] - Lock-serialized implementation over a persistence engine
//! - [`LockGranularity`] - Store-wide or per-user serialization
//! - [`open_store`] - Helper to build a store from [`Config`]
//! - [`open_configured_store`] - Load configuration, then build the store
//!
//! # Missing Records
//!
//! `load` reports a missing record as `Ok(false)`. `delete` reports it as
//! [`CredentialStoreError::NotFound`]. `store` treats it as the signal to
//! insert rather than update.
//!
//! # Example
//!
//! ```
//! use credkeep_core::{Credential, CredentialStore, MemoryEngine, PersistentCredentialStore};
//!
//! let store = PersistentCredentialStore::new(MemoryEngine::new());
//! let credential = Credential::new().with_access_token("token");
//!
//! store.store("alice", &credential).unwrap();
//! store.delete("alice", &credential).unwrap();
//! assert!(store.delete("alice", &credential).is_err());
//! ```

use std::path::Path;
use thiserror::Error;

use crate::config::{Config, EngineKind};
use crate::engine::{EngineError, FileEngine, MemoryEngine};
use crate::error::CredkeepError;
use crate::model::Credential;

mod lock;
mod persistent;

pub use lock::LockGranularity;
pub use persistent::{PersistentCredentialStore, PersistentCredentialStoreBuilder};

/// Error type for credential store operations.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    /// A required input was empty or missing.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// No credential is stored for this user.
    #[error("no credential stored for user {user_id}")]
    NotFound { user_id: String },

    /// The persistence engine failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Per-user OAuth2 credential persistence.
///
/// Implementations must be safe to call from many threads at once.
pub trait CredentialStore: Send + Sync {
    /// Persist `credential` for `user_id`.
    ///
    /// Creates the record if none exists, otherwise updates it in place.
    fn store(&self, user_id: &str, credential: &Credential) -> Result<(), CredentialStoreError>;

    /// Load the credential for `user_id` into `credential`.
    ///
    /// Returns `Ok(false)` and leaves `credential` untouched if nothing is
    /// stored for this user.
    fn load(&self, user_id: &str, credential: &mut Credential) -> Result<bool, CredentialStoreError>;

    /// Delete the credential for `user_id`.
    ///
    /// Unlike [`load`](Self::load), a missing record is an error:
    /// [`CredentialStoreError::NotFound`]. `credential` is not used to locate
    /// the record.
    fn delete(&self, user_id: &str, credential: &Credential) -> Result<(), CredentialStoreError>;
}

/// Build a credential store for the engine selected in `config`.
///
/// # Engine Selection
///
/// - `memory`: a fresh [`MemoryEngine`]; nothing survives the process
/// - `file`: a [`FileEngine`] at the configured (or default) data file
/// - `keyring`: a [`KeyringEngine`](crate::engine::KeyringEngine) when the
///   `keyring-engine` feature is enabled and the keyring is reachable;
///   otherwise falls back to the file engine with a warning
pub fn open_store(config: &Config) -> Result<Box<dyn CredentialStore>, CredentialStoreError> {
    let granularity = config.lock_granularity;

    match config.engine {
        EngineKind::Memory => {
            tracing::debug!("Using in-memory credential storage");
            Ok(Box::new(PersistentCredentialStore::with_granularity(
                MemoryEngine::new(),
                granularity,
            )))
        }
        EngineKind::File => open_file_store(config),
        EngineKind::Keyring => {
            #[cfg(feature = "keyring-engine")]
            match crate::engine::KeyringEngine::try_new(&config.keyring_service) {
                Ok(engine) => {
                    tracing::info!("Using OS keyring for credential storage");
                    return Ok(Box::new(PersistentCredentialStore::with_granularity(
                        engine,
                        granularity,
                    )));
                }
                Err(e) => {
                    tracing::warn!("Keyring unavailable ({}), falling back to file storage", e);
                }
            }

            #[cfg(not(feature = "keyring-engine"))]
            tracing::warn!(
                "Keyring storage requested but keyring-engine feature not enabled. \
                 Using file storage."
            );

            open_file_store(config)
        }
    }
}

/// Load configuration and open the store it selects.
///
/// Reads `config_path` if given, otherwise the default configuration file.
/// A missing file means default configuration.
pub fn open_configured_store(
    config_path: Option<&Path>,
) -> Result<(Config, Box<dyn CredentialStore>), CredkeepError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let store = open_store(&config)?;
    Ok((config, store))
}

fn open_file_store(config: &Config) -> Result<Box<dyn CredentialStore>, CredentialStoreError> {
    let path = config.data_file()?;
    let engine = FileEngine::new(path)?;
    tracing::info!("Using file credential storage at {:?}", engine.path());
    Ok(Box::new(PersistentCredentialStore::with_granularity(
        engine,
        config.lock_granularity,
    )))
}
