//! In-memory persistence engine.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{EngineError, HandleFactory, PersistenceHandle};
use crate::record::PersistedCredential;

type Records = Arc<RwLock<HashMap<String, PersistedCredential>>>;

/// In-memory engine for testing and development.
///
/// This engine is not persistent; data is lost when the process exits.
/// Clones share the same record set, so a test can keep one clone for
/// inspection while a store owns another.
///
/// # Thread Safety
///
/// This implementation uses interior mutability via `RwLock` and is
/// safe to share across threads.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    records: Records,
}

impl MemoryEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    ///
    /// Fails with [`EngineError::Backend`] if the record lock is poisoned.
    pub fn len(&self) -> Result<usize, EngineError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.len())
    }

    /// Whether the engine holds no records.
    pub fn is_empty(&self) -> Result<bool, EngineError> {
        Ok(self.len()? == 0)
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("records_count", &self.len().ok())
            .finish()
    }
}

impl HandleFactory for MemoryEngine {
    type Handle = MemoryHandle;

    fn acquire(&self) -> Result<MemoryHandle, EngineError> {
        Ok(MemoryHandle {
            records: Arc::clone(&self.records),
            open: true,
        })
    }
}

/// Handle onto a [`MemoryEngine`].
pub struct MemoryHandle {
    records: Records,
    open: bool,
}

impl MemoryHandle {
    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.open {
            Ok(())
        } else {
            Err(EngineError::HandleClosed)
        }
    }
}

fn poisoned(e: impl std::fmt::Display) -> EngineError {
    EngineError::Backend {
        message: format!("lock poisoned: {}", e),
    }
}

impl PersistenceHandle for MemoryHandle {
    fn find(&mut self, user_id: &str) -> Result<Option<PersistedCredential>, EngineError> {
        self.ensure_open()?;
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(user_id).cloned())
    }

    fn insert(&mut self, record: PersistedCredential) -> Result<(), EngineError> {
        self.ensure_open()?;
        let mut records = self.records.write().map_err(poisoned)?;
        if records.contains_key(&record.user_id) {
            return Err(EngineError::Duplicate {
                user_id: record.user_id,
            });
        }
        records.insert(record.user_id.clone(), record);
        Ok(())
    }

    fn update(&mut self, record: &PersistedCredential) -> Result<(), EngineError> {
        self.ensure_open()?;
        let mut records = self.records.write().map_err(poisoned)?;
        let existing = records
            .get_mut(&record.user_id)
            .ok_or_else(|| EngineError::Missing {
                user_id: record.user_id.clone(),
            })?;

        if existing.object_id != record.object_id {
            return Err(EngineError::Conflict {
                user_id: record.user_id.clone(),
            });
        }

        let version = existing.version + 1;
        *existing = record.clone();
        existing.version = version;
        Ok(())
    }

    fn remove(&mut self, user_id: &str) -> Result<(), EngineError> {
        self.ensure_open()?;
        let mut records = self.records.write().map_err(poisoned)?;
        records
            .remove(user_id)
            .map(|_| ())
            .ok_or_else(|| EngineError::Missing {
                user_id: user_id.to_string(),
            })
    }

    fn close(&mut self) {
        self.open = false;
    }
}
