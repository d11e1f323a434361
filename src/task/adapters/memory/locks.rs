//! Keyed async locks with bounded waits.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Why a keyed lock could not be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LockError {
    /// The wait exceeded the timeout.
    TimedOut,
    /// The lock table itself was poisoned.
    Poisoned,
}

/// One async mutex per key, created on first use and dropped once no
/// holder or waiter remains.
#[derive(Debug)]
pub(super) struct LockTable<K> {
    entries: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for LockTable<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

/// Holds the lock on one key until dropped.
#[derive(Debug)]
pub(super) struct KeyGuard<'table, K: Eq + Hash + Copy> {
    table: &'table LockTable<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Copy> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.table.prune(self.key);
    }
}

impl<K: Eq + Hash + Copy> LockTable<K> {
    /// Waits at most `timeout` for the lock on `key`.
    pub(super) async fn acquire(
        &self,
        key: K,
        timeout: Duration,
    ) -> Result<KeyGuard<'_, K>, LockError> {
        let mutex = {
            let mut entries = self.entries.lock().map_err(|_| LockError::Poisoned)?;
            Arc::clone(entries.entry(key).or_default())
        };
        match tokio::time::timeout(timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(KeyGuard {
                table: self,
                key,
                guard: Some(guard),
            }),
            Err(_) => {
                self.prune(key);
                Err(LockError::TimedOut)
            }
        }
    }

    /// Number of keys with a live mutex.
    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Removes the entry for `key` when only the table still refers to it.
    ///
    /// Clones are taken under the same map lock, so a count of one means no
    /// task holds or awaits the mutex.
    fn prune(&self, key: K) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries
            .get(&key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            entries.remove(&key);
        }
    }
}
