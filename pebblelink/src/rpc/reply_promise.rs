//! ReplyPromise: the delivery half of an outstanding request.
//!
//! Stored in the [`PendingRequests`](super::PendingRequests) table and
//! consumed by whichever path resolves the request first.

use tokio::sync::oneshot;

use super::reply_error::ReplyError;

/// Delivery half of a correlated request.
///
/// Consumed on delivery, so a request is resolved at most once. Dropping it
/// unresolved surfaces [`ReplyError::Dropped`] to the waiter.
#[derive(Debug)]
pub struct ReplyPromise<T> {
    sender: oneshot::Sender<Result<T, ReplyError>>,
}

impl<T> ReplyPromise<T> {
    pub(crate) fn new(sender: oneshot::Sender<Result<T, ReplyError>>) -> Self {
        Self { sender }
    }

    /// Resolve with a response.
    ///
    /// Returns `false` if the waiter is already gone.
    pub fn send(self, value: T) -> bool {
        self.sender.send(Ok(value)).is_ok()
    }

    /// Resolve with an error.
    ///
    /// Returns `false` if the waiter is already gone.
    pub fn send_error(self, error: ReplyError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }
}
