//! Lock-serialized credential store over a [`HandleFactory`].

use tracing::debug;

use super::lock::{LockGranularity, OperationLocks};
use super::{CredentialStore, CredentialStoreError};
use crate::engine::{HandleFactory, HandleScope, PersistenceHandle};
use crate::model::Credential;
use crate::record::PersistedCredential;

/// Thread-safe credential store backed by a persistence engine.
///
/// Every operation validates its input, opens a fresh handle from the
/// factory, takes the operation lock, does its work, then releases the lock
/// followed by the handle. Both releases happen on every exit path.
///
/// By default the lock is store-wide: operations on unrelated users still run
/// one at a time. [`LockGranularity::PerKey`] only serializes operations on
/// the same user.
///
/// The lock lives in this instance. Two stores over the same engine do not
/// exclude each other, so use one store per engine.
///
/// # Example
///
/// ```
/// use credkeep_core::{Credential, CredentialStore, MemoryEngine, PersistentCredentialStore};
///
/// let store = PersistentCredentialStore::new(MemoryEngine::new());
/// store.store("alice", &Credential::new().with_access_token("token")).unwrap();
///
/// let mut loaded = Credential::new();
/// assert!(store.load("alice", &mut loaded).unwrap());
/// assert_eq!(loaded.access_token.unwrap().expose(), "token");
/// ```
pub struct PersistentCredentialStore<F: HandleFactory> {
    factory: F,
    locks: OperationLocks,
}

impl<F: HandleFactory> PersistentCredentialStore<F> {
    /// Create a store with a store-wide lock.
    pub fn new(factory: F) -> Self {
        Self::with_granularity(factory, LockGranularity::StoreWide)
    }

    /// Create a store with the given lock granularity.
    pub fn with_granularity(factory: F, granularity: LockGranularity) -> Self {
        Self {
            factory,
            locks: OperationLocks::new(granularity),
        }
    }

    /// Start building a store.
    pub fn builder() -> PersistentCredentialStoreBuilder<F> {
        PersistentCredentialStoreBuilder::default()
    }

    /// The handle factory this store draws from.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The lock granularity in effect.
    pub fn lock_granularity(&self) -> LockGranularity {
        self.locks.granularity()
    }

    fn open(&self) -> Result<HandleScope<F::Handle>, CredentialStoreError> {
        Ok(HandleScope::new(self.factory.acquire()?))
    }
}

fn validate_user_id(user_id: &str) -> Result<(), CredentialStoreError> {
    if user_id.trim().is_empty() {
        return Err(CredentialStoreError::InvalidArgument {
            message: "user id must not be empty".to_string(),
        });
    }
    Ok(())
}

impl<F: HandleFactory> CredentialStore for PersistentCredentialStore<F> {
    fn store(&self, user_id: &str, credential: &Credential) -> Result<(), CredentialStoreError> {
        validate_user_id(user_id)?;
        let mut handle = self.open()?;
        let _guard = self.locks.acquire(user_id);

        match handle.find(user_id)? {
            Some(mut record) => {
                record.update_from(credential);
                handle.update(&record)?;
                debug!(user_id, object_id = %record.object_id, "updated credential record");
            }
            None => {
                let record = PersistedCredential::new(user_id, credential);
                let object_id = record.object_id;
                handle.insert(record)?;
                debug!(user_id, %object_id, "inserted credential record");
            }
        }
        Ok(())
    }

    fn load(&self, user_id: &str, credential: &mut Credential) -> Result<bool, CredentialStoreError> {
        validate_user_id(user_id)?;
        let mut handle = self.open()?;
        let _guard = self.locks.acquire(user_id);

        match handle.find(user_id)? {
            Some(record) => {
                record.load_into(credential);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, user_id: &str, _credential: &Credential) -> Result<(), CredentialStoreError> {
        validate_user_id(user_id)?;
        let mut handle = self.open()?;
        let _guard = self.locks.acquire(user_id);

        if handle.find(user_id)?.is_none() {
            return Err(CredentialStoreError::NotFound {
                user_id: user_id.to_string(),
            });
        }
        handle.remove(user_id)?;
        debug!(user_id, "removed credential record");
        Ok(())
    }
}

impl<F: HandleFactory> std::fmt::Debug for PersistentCredentialStore<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCredentialStore")
            .field("lock_granularity", &self.locks.granularity())
            .finish()
    }
}

/// Builder for [`PersistentCredentialStore`].
///
/// [`build`](Self::build) fails if no factory was supplied.
pub struct PersistentCredentialStoreBuilder<F: HandleFactory> {
    factory: Option<F>,
    granularity: LockGranularity,
}

impl<F: HandleFactory> Default for PersistentCredentialStoreBuilder<F> {
    fn default() -> Self {
        Self {
            factory: None,
            granularity: LockGranularity::default(),
        }
    }
}

impl<F: HandleFactory> PersistentCredentialStoreBuilder<F> {
    /// Set the handle factory.
    pub fn factory(mut self, factory: F) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the lock granularity.
    pub fn lock_granularity(mut self, granularity: LockGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn build(self) -> Result<PersistentCredentialStore<F>, CredentialStoreError> {
        let factory = self
            .factory
            .ok_or_else(|| CredentialStoreError::InvalidArgument {
                message: "a handle factory is required".to_string(),
            })?;
        Ok(PersistentCredentialStore::with_granularity(
            factory,
            self.granularity,
        ))
    }
}
