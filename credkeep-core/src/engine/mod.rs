//! Persistence engine abstraction.
//!
//! This module provides:
//! - [`PersistenceHandle`] - A short-lived session against a backing engine
//! - [`HandleFactory`] - Produces a fresh handle for each store operation
//! - [`MemoryEngine`] - In-process engine for tests and development
//! - [`FileEngine`] - JSON file engine with atomic replacement
//! - [`KeyringEngine`] - OS keyring engine (with `keyring-engine` feature)
//!
//! # Engine Contract
//!
//! Every engine keeps at most one [`PersistedCredential`] per user id and
//! honours these rules:
//!
//! - `find` returns `Ok(None)` for an absent key; `Err` is reserved for real
//!   failures.
//! - `insert` on an existing key fails with [`EngineError::Duplicate`].
//! - `update` on an absent key fails with [`EngineError::Missing`]; an update
//!   whose `object_id` differs from the stored record fails with
//!   [`EngineError::Conflict`]. A successful update advances `version`.
//! - `remove` on an absent key fails with [`EngineError::Missing`].
//! - After `close`, every call fails with [`EngineError::HandleClosed`].

use thiserror::Error;

use crate::record::PersistedCredential;

mod file;
#[cfg(feature = "keyring-engine")]
mod keyring;
mod memory;

pub use file::{FileEngine, FileHandle};
#[cfg(feature = "keyring-engine")]
pub use keyring::{KeyringEngine, KeyringHandle};
pub use memory::{MemoryEngine, MemoryHandle};

/// Error type for persistence engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not hand out a session.
    #[error("engine unavailable: {message}")]
    Unavailable { message: String },

    /// The handle was used after it was closed.
    #[error("persistence handle already closed")]
    HandleClosed,

    /// A record for this user already exists.
    #[error("record already exists for user {user_id}")]
    Duplicate { user_id: String },

    /// No record exists for this user.
    #[error("no record for user {user_id}")]
    Missing { user_id: String },

    /// The stored record has a different identity than the one being written.
    #[error("record identity changed for user {user_id}")]
    Conflict { user_id: String },

    /// I/O error reading or writing engine storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    Backend { message: String },
}

/// A session against a backing engine, scoped to a single store operation.
pub trait PersistenceHandle {
    /// Look up the record for `user_id`.
    fn find(&mut self, user_id: &str) -> Result<Option<PersistedCredential>, EngineError>;

    /// Persist a new record.
    fn insert(&mut self, record: PersistedCredential) -> Result<(), EngineError>;

    /// Write back a record previously returned by [`find`](Self::find).
    fn update(&mut self, record: &PersistedCredential) -> Result<(), EngineError>;

    /// Delete the record for `user_id`.
    fn remove(&mut self, user_id: &str) -> Result<(), EngineError>;

    /// Release the session. Calling it more than once has no further effect.
    fn close(&mut self);
}

/// Source of [`PersistenceHandle`]s.
pub trait HandleFactory: Send + Sync {
    type Handle: PersistenceHandle;

    /// Open a new handle.
    fn acquire(&self) -> Result<Self::Handle, EngineError>;
}

/// Closes the wrapped handle when dropped.
pub(crate) struct HandleScope<H: PersistenceHandle> {
    handle: H,
}

impl<H: PersistenceHandle> HandleScope<H> {
    pub(crate) fn new(handle: H) -> Self {
        tracing::trace!("persistence handle acquired");
        Self { handle }
    }
}

impl<H: PersistenceHandle> std::ops::Deref for HandleScope<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: PersistenceHandle> std::ops::DerefMut for HandleScope<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

impl<H: PersistenceHandle> Drop for HandleScope<H> {
    fn drop(&mut self) {
        self.handle.close();
        tracing::trace!("persistence handle released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingHandle {
        closes: Rc<Cell<u32>>,
    }

    impl PersistenceHandle for CountingHandle {
        fn find(&mut self, _: &str) -> Result<Option<PersistedCredential>, EngineError> {
            Ok(None)
        }

        fn insert(&mut self, _: PersistedCredential) -> Result<(), EngineError> {
            Ok(())
        }

        fn update(&mut self, _: &PersistedCredential) -> Result<(), EngineError> {
            Ok(())
        }

        fn remove(&mut self, _: &str) -> Result<(), EngineError> {
            Ok(())
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    #[test]
    fn test_scope_closes_on_drop() {
        let closes = Rc::new(Cell::new(0));
        {
            let mut scope = HandleScope::new(CountingHandle {
                closes: Rc::clone(&closes),
            });
            assert!(scope.find("alice").unwrap().is_none());
        }
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_scope_closes_on_early_return() {
        fn failing(closes: Rc<Cell<u32>>) -> Result<(), EngineError> {
            let _scope = HandleScope::new(CountingHandle { closes });
            Err(EngineError::Backend {
                message: "boom".to_string(),
            })
        }

        let closes = Rc::new(Cell::new(0));
        assert!(failing(Rc::clone(&closes)).is_err());
        assert_eq!(closes.get(), 1);
    }
}
