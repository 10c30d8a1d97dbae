//! # credkeep Core
//!
//! Thread-safe persistence of per-user OAuth2 credentials.
//!
//! This crate provides:
//! - [`Credential`] and [`Secret`] - The caller-owned token state
//! - [`CredentialStore`] - store / load / delete keyed by user id
//! - [`PersistentCredentialStore`] - A lock-serialized store over any [`HandleFactory`]
//! - Memory, JSON file and (optionally) OS keyring persistence engines
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use credkeep_core::{Credential, CredentialStore, FileEngine, PersistentCredentialStore};
//!
//! let engine = FileEngine::new("/var/lib/myapp/credentials.json")?;
//! let store = PersistentCredentialStore::new(engine);
//!
//! store.store("alice", &Credential::new().with_access_token("ya29.a0"))?;
//!
//! let mut credential = Credential::new();
//! if store.load("alice", &mut credential)? {
//!     println!("expires in {:?}s", credential.expires_in_seconds());
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod record;
pub mod store;

// Re-export commonly used types at crate root
pub use model::{
    Credential,
    ExpiryOutOfRange,
    Secret,
};

pub use record::PersistedCredential;

pub use engine::{
    EngineError,
    FileEngine,
    HandleFactory,
    MemoryEngine,
    PersistenceHandle,
};

#[cfg(feature = "keyring-engine")]
pub use engine::KeyringEngine;

pub use store::{
    CredentialStore,
    CredentialStoreError,
    LockGranularity,
    PersistentCredentialStore,
    open_configured_store,
    open_store,
};

pub use config::{
    Config,
    ConfigError,
    EngineKind,
};

pub use error::CredkeepError;
