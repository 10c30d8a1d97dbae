//! OS keyring-backed persistence engine.

use keyring::Entry;

use super::{EngineError, HandleFactory, PersistenceHandle};
use crate::record::PersistedCredential;

/// OS keyring-backed engine.
///
/// This engine uses the platform's native keyring service:
/// - macOS: Keychain
/// - Linux: Secret Service API (via libsecret)
/// - Windows: Credential Manager
///
/// # Entry Format
///
/// Each user gets one entry with service `{service_name}` and user
/// `{user_id}`; the password is the JSON-encoded [`PersistedCredential`].
///
/// # Example
///
/// ```rust,ignore
/// use credkeep_core::{Credential, CredentialStore, KeyringEngine, PersistentCredentialStore};
///
/// let engine = KeyringEngine::try_new("credkeep").unwrap();
/// let store = PersistentCredentialStore::new(engine);
/// store.store("alice", &Credential::new().with_access_token("token")).unwrap();
/// ```
#[derive(Clone)]
pub struct KeyringEngine {
    service_name: String,
}

impl KeyringEngine {
    /// Try to create a new keyring engine.
    ///
    /// Returns an error if the keyring backend is not available on this platform.
    pub fn try_new(service_name: &str) -> Result<Self, EngineError> {
        match Entry::new(service_name, "__availability_check__") {
            Ok(_) => Ok(Self {
                service_name: service_name.to_string(),
            }),
            Err(e) => Err(EngineError::Unavailable {
                message: format!("keyring backend not available: {}", e),
            }),
        }
    }
}

impl std::fmt::Debug for KeyringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringEngine")
            .field("service_name", &self.service_name)
            .finish()
    }
}

impl HandleFactory for KeyringEngine {
    type Handle = KeyringHandle;

    fn acquire(&self) -> Result<KeyringHandle, EngineError> {
        Ok(KeyringHandle {
            service_name: self.service_name.clone(),
            open: true,
        })
    }
}

/// Handle onto a [`KeyringEngine`].
pub struct KeyringHandle {
    service_name: String,
    open: bool,
}

impl KeyringHandle {
    fn entry(&self, user_id: &str) -> Result<Entry, EngineError> {
        if !self.open {
            return Err(EngineError::HandleClosed);
        }
        Entry::new(&self.service_name, user_id).map_err(|e| EngineError::Backend {
            message: format!("failed to create keyring entry: {}", e),
        })
    }

    fn write(&self, entry: &Entry, record: &PersistedCredential) -> Result<(), EngineError> {
        let json = serde_json::to_string(record)?;
        entry
            .set_password(&json)
            .map_err(|e| EngineError::Backend {
                message: format!("failed to set keyring password: {}", e),
            })
    }
}

fn read_entry(entry: &Entry) -> Result<Option<PersistedCredential>, EngineError> {
    match entry.get_password() {
        Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(keyring::Error::Ambiguous(_)) => Err(EngineError::Backend {
            message: "ambiguous keyring entry".to_string(),
        }),
        Err(keyring::Error::PlatformFailure(e)) => Err(EngineError::Backend {
            message: format!("platform keyring failure: {}", e),
        }),
        Err(e) => Err(EngineError::Backend {
            message: format!("keyring error: {}", e),
        }),
    }
}

impl PersistenceHandle for KeyringHandle {
    fn find(&mut self, user_id: &str) -> Result<Option<PersistedCredential>, EngineError> {
        let entry = self.entry(user_id)?;
        read_entry(&entry)
    }

    fn insert(&mut self, record: PersistedCredential) -> Result<(), EngineError> {
        let entry = self.entry(&record.user_id)?;
        if read_entry(&entry)?.is_some() {
            return Err(EngineError::Duplicate {
                user_id: record.user_id,
            });
        }
        self.write(&entry, &record)
    }

    fn update(&mut self, record: &PersistedCredential) -> Result<(), EngineError> {
        let entry = self.entry(&record.user_id)?;
        let existing = read_entry(&entry)?.ok_or_else(|| EngineError::Missing {
            user_id: record.user_id.clone(),
        })?;

        if existing.object_id != record.object_id {
            return Err(EngineError::Conflict {
                user_id: record.user_id.clone(),
            });
        }

        let mut next = record.clone();
        next.version = existing.version + 1;
        self.write(&entry, &next)
    }

    fn remove(&mut self, user_id: &str) -> Result<(), EngineError> {
        let entry = self.entry(user_id)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Err(EngineError::Missing {
                user_id: user_id.to_string(),
            }),
            Err(e) => Err(EngineError::Backend {
                message: format!("failed to delete keyring entry: {}", e),
            }),
        }
    }

    fn close(&mut self) {
        self.open = false;
    }
}
