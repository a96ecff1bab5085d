//! ReplyFuture: the awaiting half of an outstanding request.
//!
//! Returned by [`PendingRequests::register`]. Awaiting consumes it, so a
//! request cannot be awaited twice.

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use pebblelink_core::{TimeError, TimeProvider, TokioTimeProvider};
use tokio::sync::oneshot;

use super::pending::PendingRequests;
use super::reply_error::ReplyError;

/// Waits for the response to one outstanding request.
///
/// Dropping it before a result is observed removes the pending entry, so a
/// late response for its key is discarded.
pub struct ReplyFuture<K: Eq + Hash, T, TP = TokioTimeProvider> {
    key: K,
    entry_id: u64,
    receiver: oneshot::Receiver<Result<T, ReplyError>>,
    table: PendingRequests<K, T, TP>,
    created_at: Duration,
    settled: bool,
}

impl<K: Eq + Hash + fmt::Debug, T, TP> fmt::Debug for ReplyFuture<K, T, TP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyFuture")
            .field("key", &self.key)
            .field("entry", &self.entry_id)
            .field("settled", &self.settled)
            .finish()
    }
}

impl<K: Eq + Hash, T, TP> ReplyFuture<K, T, TP> {
    pub(crate) fn new(
        key: K,
        entry_id: u64,
        receiver: oneshot::Receiver<Result<T, ReplyError>>,
        table: PendingRequests<K, T, TP>,
        created_at: Duration,
    ) -> Self {
        Self {
            key,
            entry_id,
            receiver,
            table,
            created_at,
            settled: false,
        }
    }

    /// Correlation key this future waits on.
    pub fn key(&self) -> &K {
        &self.key
    }

    #[cfg(test)]
    pub(crate) fn entry_id(&self) -> u64 {
        self.entry_id
    }

    /// When the request was registered, on its time provider's clock.
    pub fn created_at(&self) -> Duration {
        self.created_at
    }
}

impl<K, T, TP> ReplyFuture<K, T, TP>
where
    K: Eq + Hash + fmt::Debug + Send,
    T: Send,
    TP: TimeProvider,
{
    /// Suspend until the request is resolved or `timeout` elapses.
    ///
    /// On timeout the pending entry is removed under the table lock. If a
    /// response won that race, it is returned instead of the timeout.
    ///
    /// # Errors
    ///
    /// - [`ReplyError::Timeout`] when no response arrived in time
    /// - [`ReplyError::Cancelled`] when the request was cancelled
    /// - [`ReplyError::Dropped`] when the entry vanished unresolved
    pub async fn await_result(mut self, timeout: Duration) -> Result<T, ReplyError> {
        let time = self.table.time().clone();
        let outcome = time.timeout(timeout, &mut self.receiver).await;
        self.settled = true;

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ReplyError::Dropped),
            Err(TimeError::Elapsed) => {
                if self.table.expire(&self.key, self.entry_id) {
                    let waited = time.now().saturating_sub(self.created_at);
                    tracing::debug!(key = ?self.key, ?timeout, ?waited, "request timed out");
                    Err(ReplyError::Timeout)
                } else {
                    // Resolved between the timer firing and the expiry.
                    self.receiver.try_recv().unwrap_or(Err(ReplyError::Dropped))
                }
            }
        }
    }
}

impl<K: Eq + Hash, T, TP> Drop for ReplyFuture<K, T, TP> {
    fn drop(&mut self) {
        if !self.settled {
            self.table.expire(&self.key, self.entry_id);
        }
    }
}
