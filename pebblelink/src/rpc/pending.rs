//! PendingRequests: correlation key → outstanding request.
//!
//! The inbound path resolves requests by key; waiters suspend on their
//! [`ReplyFuture`] with a timeout. Every entry reaches exactly one terminal
//! state: completed, cancelled, or expired by its waiter's timeout. All
//! three remove the entry under the table lock, so whichever runs first
//! wins and the others find nothing to resolve.
//!
//! A key can be reused once its request is terminal, so every entry also
//! carries an id unique within its table. Expiry is keyed by `(key, id)`:
//! a stale waiter never evicts the entry of a later request on its key.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pebblelink_core::{TimeProvider, TokioTimeProvider};
use tokio::sync::oneshot;

use super::reply_error::ReplyError;
use super::reply_future::ReplyFuture;
use super::reply_promise::ReplyPromise;

struct Entry<T> {
    id: u64,
    promise: ReplyPromise<T>,
}

struct Entries<K, T> {
    by_key: HashMap<K, Entry<T>>,
    next_id: u64,
}

/// Table of outstanding requests keyed by correlation key.
///
/// Cheap to clone; clones share the same table.
pub struct PendingRequests<K, T, TP = TokioTimeProvider> {
    entries: Arc<Mutex<Entries<K, T>>>,
    time: TP,
}

impl<K, T, TP: Clone> Clone for PendingRequests<K, T, TP> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            time: self.time.clone(),
        }
    }
}

impl<K, T, TP> fmt::Debug for PendingRequests<K, T, TP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.entries.lock().map_or(0, |entries| entries.by_key.len());
        f.debug_struct("PendingRequests")
            .field("outstanding", &len)
            .finish()
    }
}

impl<K, T> Default for PendingRequests<K, T, TokioTimeProvider> {
    fn default() -> Self {
        Self::new(TokioTimeProvider::new())
    }
}

impl<K, T, TP> PendingRequests<K, T, TP> {
    /// Create an empty table using `time` for timeouts.
    pub fn new(time: TP) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries {
                by_key: HashMap::new(),
                next_id: 0,
            })),
            time,
        }
    }

    /// Time provider used by this table's waiters.
    pub fn time(&self) -> &TP {
        &self.time
    }

    fn lock(&self) -> MutexGuard<'_, Entries<K, T>> {
        // Entries stay consistent across a panic: every mutation is a single
        // insert or remove.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.lock().by_key.len()
    }

    /// Whether no request is outstanding.
    pub fn is_empty(&self) -> bool {
        self.lock().by_key.is_empty()
    }
}

impl<K, T, TP> PendingRequests<K, T, TP>
where
    K: Eq + Hash,
{
    /// Whether a request with `key` is outstanding.
    pub fn contains(&self, key: &K) -> bool {
        self.lock().by_key.contains_key(key)
    }

    /// Remove the entry `id` under `key` without resolving it.
    ///
    /// Returns whether it was present. A different entry under the same key
    /// is left alone.
    pub(crate) fn expire(&self, key: &K, id: u64) -> bool {
        let mut entries = self.lock();
        match entries.by_key.get(key) {
            Some(entry) if entry.id == id => entries.by_key.remove(key).is_some(),
            _ => false,
        }
    }
}

impl<K, T, TP> PendingRequests<K, T, TP>
where
    K: Eq + Hash + Clone + fmt::Debug,
    TP: TimeProvider,
{
    /// Mark `key` as awaited and return the future that resolves it.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::DuplicateKey`] if `key` is already outstanding;
    /// the existing request is left untouched.
    pub fn register(&self, key: K) -> Result<ReplyFuture<K, T, TP>, ReplyError> {
        let (sender, receiver) = oneshot::channel();
        let id = {
            let mut entries = self.lock();
            if entries.by_key.contains_key(&key) {
                return Err(ReplyError::DuplicateKey);
            }
            let id = entries.next_id;
            entries.next_id = entries.next_id.wrapping_add(1);
            let promise = ReplyPromise::new(sender);
            entries.by_key.insert(key.clone(), Entry { id, promise });
            id
        };
        let created_at = self.time.now();
        tracing::trace!(?key, id, ?created_at, "request registered");
        Ok(ReplyFuture::new(key, id, receiver, self.clone(), created_at))
    }

    /// Deliver `value` to the request waiting on `key`.
    ///
    /// Returns `false` when no such request is outstanding, e.g. because it
    /// already timed out; the value is dropped.
    pub fn complete(&self, key: &K, value: T) -> bool {
        let mut entries = self.lock();
        match entries.by_key.remove(key) {
            Some(Entry { promise, .. }) => {
                // Sent under the lock so an expiring waiter sees either the
                // entry or the value, never neither.
                promise.send(value);
                true
            }
            None => {
                tracing::trace!(?key, "no outstanding request for key");
                false
            }
        }
    }

    /// Resolve the request waiting on `key` with [`ReplyError::Cancelled`].
    ///
    /// Returns `false` when no such request is outstanding.
    pub fn cancel(&self, key: &K) -> bool {
        let mut entries = self.lock();
        match entries.by_key.remove(key) {
            Some(Entry { promise, .. }) => {
                promise.send_error(ReplyError::Cancelled);
                tracing::debug!(?key, "request cancelled");
                true
            }
            None => false,
        }
    }
}
