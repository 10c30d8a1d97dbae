//! Operation locks for [`PersistentCredentialStore`](super::PersistentCredentialStore).

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, MutexGuard, RawMutex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// How store operations are serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockGranularity {
    /// One lock for the whole store: no two operations run at once, whatever
    /// their keys.
    #[default]
    StoreWide,

    /// One lock per user id: operations on the same user are serialized,
    /// operations on different users may overlap.
    PerKey,
}

type KeyTable = Mutex<HashMap<String, Arc<Mutex<()>>>>;

pub(crate) enum OperationLocks {
    StoreWide(Mutex<()>),
    PerKey(KeyTable),
}

impl OperationLocks {
    pub(crate) fn new(granularity: LockGranularity) -> Self {
        match granularity {
            LockGranularity::StoreWide => Self::StoreWide(Mutex::new(())),
            LockGranularity::PerKey => Self::PerKey(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn granularity(&self) -> LockGranularity {
        match self {
            Self::StoreWide(_) => LockGranularity::StoreWide,
            Self::PerKey(_) => LockGranularity::PerKey,
        }
    }

    /// Block until the caller may operate on `user_id`.
    pub(crate) fn acquire(&self, user_id: &str) -> OperationGuard<'_> {
        match self {
            Self::StoreWide(lock) => OperationGuard::StoreWide(lock.lock()),
            Self::PerKey(table) => {
                let slot = Arc::clone(table.lock().entry(user_id.to_string()).or_default());
                OperationGuard::PerKey {
                    table,
                    user_id: user_id.to_string(),
                    guard: Some(slot.lock_arc()),
                }
            }
        }
    }

    /// Number of live per-key slots. Always zero for a store-wide lock.
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        match self {
            Self::StoreWide(_) => 0,
            Self::PerKey(table) => table.lock().len(),
        }
    }
}

/// Held for the duration of one store operation.
pub(crate) enum OperationGuard<'a> {
    StoreWide(#[allow(dead_code)] MutexGuard<'a, ()>),
    PerKey {
        table: &'a KeyTable,
        user_id: String,
        guard: Option<ArcMutexGuard<RawMutex, ()>>,
    },
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        if let Self::PerKey {
            table,
            user_id,
            guard,
        } = self
        {
            let Some(guard) = guard.take() else {
                return;
            };
            let slot = Arc::clone(ArcMutexGuard::mutex(&guard));
            drop(guard);

            // The table and `slot` are the only owners left when nobody else
            // holds or waits on this key.
            let mut table = table.lock();
            if Arc::strong_count(&slot) == 2 {
                table.remove(user_id.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_store_wide_blocks_other_keys() {
        let locks = Arc::new(OperationLocks::new(LockGranularity::StoreWide));
        let entered = Arc::new(AtomicBool::new(false));

        let guard = locks.acquire("alice");
        let handle = {
            let locks = Arc::clone(&locks);
            let entered = Arc::clone(&entered);
            thread::spawn(move || {
                let _guard = locks.acquire("bob");
                entered.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(Ordering::SeqCst));
        drop(guard);
        handle.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }

    #[test]
    fn test_per_key_allows_other_keys() {
        let locks = OperationLocks::new(LockGranularity::PerKey);

        let _alice = locks.acquire("alice");
        let _bob = locks.acquire("bob");

        assert_eq!(locks.slot_count(), 2);
    }

    #[test]
    fn test_per_key_blocks_same_key() {
        let locks = Arc::new(OperationLocks::new(LockGranularity::PerKey));
        let entered = Arc::new(AtomicBool::new(false));

        let guard = locks.acquire("alice");
        let handle = {
            let locks = Arc::clone(&locks);
            let entered = Arc::clone(&entered);
            thread::spawn(move || {
                let _guard = locks.acquire("alice");
                entered.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(Ordering::SeqCst));
        drop(guard);
        handle.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }

    #[test]
    fn test_per_key_slots_are_reclaimed() {
        let locks = OperationLocks::new(LockGranularity::PerKey);

        drop(locks.acquire("alice"));
        drop(locks.acquire("bob"));

        assert_eq!(locks.slot_count(), 0);
    }

    #[test]
    fn test_granularity_deserializes_snake_case() {
        let parsed: LockGranularity = serde_json::from_str("\"per_key\"").unwrap();
        assert_eq!(parsed, LockGranularity::PerKey);
        assert_eq!(
            OperationLocks::new(LockGranularity::StoreWide).granularity(),
            LockGranularity::StoreWide
        );
    }
}
