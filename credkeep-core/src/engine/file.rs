//! JSON file persistence engine.
//!
//! All records live in a single JSON document:
//!
//! ```json
//! { "version": 1, "records": [ { "user_id": "alice", ... } ] }
//! ```
//!
//! A missing file is an empty store. Handles never cache the document: every
//! call re-reads it, so a handle acquired before the store lock was taken
//! still observes writes made while it waited. Writes go to a temporary file
//! in the same directory which is then renamed over the original, so readers
//! see either the old document or the new one.
//!
//! Every insert, update and remove rewrites the whole document, so handles
//! from one engine (and its clones) share a write lock held across the
//! read-modify-write. Operations on different users can overlap under a
//! per-key store lock without one rewrite discarding another. Separate
//! engines opened on the same path do not share that lock.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::NamedTempFile;

use super::{EngineError, HandleFactory, PersistenceHandle};
use crate::record::PersistedCredential;

/// On-disk document layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileData {
    /// Version of the document format (for future migrations).
    version: u32,

    records: Vec<PersistedCredential>,
}

impl Default for FileData {
    fn default() -> Self {
        Self {
            version: 1,
            records: Vec::new(),
        }
    }
}

/// Engine storing every record in one JSON file.
#[derive(Debug, Clone)]
pub struct FileEngine {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl FileEngine {
    /// Get the default data file path.
    ///
    /// Returns the platform-specific data directory path for the
    /// credentials.json file.
    pub fn default_path() -> Result<PathBuf, EngineError> {
        let dirs = directories::ProjectDirs::from("com", "raibid-labs", "credkeep").ok_or_else(
            || EngineError::Unavailable {
                message: "data directory not available".to_string(),
            },
        )?;

        Ok(dirs.data_dir().join("credentials.json"))
    }

    /// Open an engine backed by the file at `path`.
    ///
    /// Creates parent directories if they don't exist. The file itself is
    /// created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            path: Arc::new(path),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Get the data file path for this engine.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HandleFactory for FileEngine {
    type Handle = FileHandle;

    fn acquire(&self) -> Result<FileHandle, EngineError> {
        Ok(FileHandle {
            path: Arc::clone(&self.path),
            write_lock: Arc::clone(&self.write_lock),
            open: true,
        })
    }
}

/// Handle onto a [`FileEngine`].
pub struct FileHandle {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
    open: bool,
}

impl FileHandle {
    fn read(&self) -> Result<FileData, EngineError> {
        if !self.open {
            return Err(EngineError::HandleClosed);
        }
        if !self.path.exists() {
            return Ok(FileData::default());
        }
        let contents = fs::read_to_string(self.path.as_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, data: &FileData) -> Result<(), EngineError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path.as_path()).map_err(|e| e.error)?;
        Ok(())
    }
}

impl PersistenceHandle for FileHandle {
    fn find(&mut self, user_id: &str) -> Result<Option<PersistedCredential>, EngineError> {
        let data = self.read()?;
        Ok(data.records.into_iter().find(|r| r.user_id == user_id))
    }

    fn insert(&mut self, record: PersistedCredential) -> Result<(), EngineError> {
        let _write = self.write_lock.lock();
        let mut data = self.read()?;
        if data.records.iter().any(|r| r.user_id == record.user_id) {
            return Err(EngineError::Duplicate {
                user_id: record.user_id,
            });
        }
        data.records.push(record);
        self.write(&data)
    }

    fn update(&mut self, record: &PersistedCredential) -> Result<(), EngineError> {
        let _write = self.write_lock.lock();
        let mut data = self.read()?;
        let existing = data
            .records
            .iter_mut()
            .find(|r| r.user_id == record.user_id)
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
        self.write(&data)
    }

    fn remove(&mut self, user_id: &str) -> Result<(), EngineError> {
        let _write = self.write_lock.lock();
        let mut data = self.read()?;
        let initial_len = data.records.len();
        data.records.retain(|r| r.user_id != user_id);

        if data.records.len() == initial_len {
            return Err(EngineError::Missing {
                user_id: user_id.to_string(),
            });
        }

        self.write(&data)
    }

    fn close(&mut self) {
        self.open = false;
    }
}
