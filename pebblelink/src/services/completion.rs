//! Exactly-once delivery of background request outcomes.

use crate::error::ProtocolError;
use crate::packet::BlobStatus;
use crate::rpc::ReplyError;

/// Holds a caller's `on_complete` until the request resolves.
///
/// Dropped unresolved (the task was aborted, or the runtime shut down), it
/// reports [`ReplyError::Cancelled`] so the callback still runs once.
pub(crate) struct Completion<F>
where
    F: FnOnce(Result<BlobStatus, ProtocolError>),
{
    callback: Option<F>,
}

impl<F> Completion<F>
where
    F: FnOnce(Result<BlobStatus, ProtocolError>),
{
    pub(crate) fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub(crate) fn complete(mut self, result: Result<BlobStatus, ProtocolError>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl<F> Drop for Completion<F>
where
    F: FnOnce(Result<BlobStatus, ProtocolError>),
{
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::warn!("request abandoned before completion, reporting cancellation");
            callback(Err(ReplyError::Cancelled.into()));
        }
    }
}
