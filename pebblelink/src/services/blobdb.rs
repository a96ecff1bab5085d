//! BlobDB command service.
//!
//! Each command travels with a fresh random token. The watch echoes the
//! token in its response, which [`BlobDbService::handle_response`] routes to
//! the waiting request.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use pebblelink_core::{RandomProvider, TimeProvider, TokioRandomProvider, TokioTimeProvider};
use tokio::task::JoinHandle;

use super::completion::Completion;
use crate::error::ProtocolError;
use crate::packet::{
    BlobCommand, BlobCommandPacket, BlobDatabase, BlobResponse, BlobStatus, encode_frame,
};
use crate::rpc::{PendingRequests, ReplyError, ReplyFuture};
use crate::transport::PacketSink;

/// Attempts at drawing a token that is not already in flight.
const MAX_TOKEN_ATTEMPTS: usize = 64;

/// Sends BlobDB commands and resolves them with the watch's status.
///
/// Cheap to clone; clones share the sink and the pending table.
#[derive(Clone)]
pub struct BlobDbService<TP = TokioTimeProvider, R = TokioRandomProvider> {
    sink: Arc<dyn PacketSink>,
    pending: PendingRequests<u16, BlobStatus, TP>,
    random: R,
    timeout: Duration,
}

impl<TP, R> fmt::Debug for BlobDbService<TP, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobDbService")
            .field("pending", &self.pending)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<TP: TimeProvider, R: RandomProvider> BlobDbService<TP, R> {
    /// Create a service sending through `sink`.
    ///
    /// Every request waits at most `timeout` for its response.
    pub fn new(sink: Arc<dyn PacketSink>, time: TP, random: R, timeout: Duration) -> Self {
        Self {
            sink,
            pending: PendingRequests::new(time),
            random,
            timeout,
        }
    }

    pub(crate) fn time(&self) -> &TP {
        self.pending.time()
    }

    /// Response timeout applied to every request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of commands awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether a command with `token` awaits a response.
    pub fn is_pending(&self, token: u16) -> bool {
        self.pending.contains(&token)
    }

    fn allocate_token(&self) -> Result<ReplyFuture<u16, BlobStatus, TP>, ReplyError> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = self.random.random_range(1..u16::MAX);
            match self.pending.register(token) {
                Ok(reply) => return Ok(reply),
                Err(ReplyError::DuplicateKey) => continue,
                Err(err) => return Err(err),
            }
        }
        tracing::warn!(
            outstanding = self.pending.len(),
            "no free blobdb token after {MAX_TOKEN_ATTEMPTS} attempts"
        );
        Err(ReplyError::DuplicateKey)
    }

    /// Send `command` and wait for the watch's status.
    ///
    /// A non-success status is returned as `Ok`; only failures to complete
    /// the exchange are errors.
    ///
    /// # Errors
    ///
    /// - `Validation` when the command cannot be encoded; nothing is sent
    /// - `Transport` when the sink refuses the frame
    /// - `Reply(Timeout)` when no response arrives within the timeout
    pub async fn request(&self, command: BlobCommand) -> Result<BlobStatus, ProtocolError> {
        command.validate()?;
        let reply = self.allocate_token()?;
        let token = *reply.key();
        let operation = command.operation();
        let database = command.database();

        // Registered before sending so an immediate response finds its entry.
        let frame = encode_frame(&BlobCommandPacket { token, command })?;
        tracing::debug!(token, ?operation, ?database, "sending blobdb command");
        self.sink.send(frame).await?;

        let status = reply.await_result(self.timeout).await?;
        tracing::debug!(token, ?status, "blobdb command resolved");
        Ok(status)
    }

    /// Send `command` in the background and report the outcome to
    /// `on_complete`.
    ///
    /// `on_complete` runs exactly once, with the watch's status or the error
    /// that ended the request (validation, transport or timeout). Aborting
    /// the returned task reports `Reply(Cancelled)`.
    pub fn send<F>(&self, command: BlobCommand, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<BlobStatus, ProtocolError>) + Send + 'static,
    {
        let service = self.clone();
        let completion = Completion::new(on_complete);
        tokio::spawn(async move {
            let result = service.request(command).await;
            completion.complete(result);
        })
    }

    /// Insert or replace `key` in `database`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn insert(
        &self,
        database: BlobDatabase,
        key: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Result<BlobStatus, ProtocolError> {
        self.request(BlobCommand::insert(database, key, value)).await
    }

    /// Delete `key` from `database`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(
        &self,
        database: BlobDatabase,
        key: impl Into<Bytes>,
    ) -> Result<BlobStatus, ProtocolError> {
        self.request(BlobCommand::delete(database, key)).await
    }

    /// Remove every entry from `database`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn clear(&self, database: BlobDatabase) -> Result<BlobStatus, ProtocolError> {
        self.request(BlobCommand::clear(database)).await
    }

    /// Route an inbound response to the request waiting on its token.
    ///
    /// Returns `false` when no request is waiting, e.g. because it already
    /// timed out; the response is dropped.
    pub fn handle_response(&self, response: BlobResponse) -> bool {
        let matched = self.pending.complete(&response.token, response.status);
        if !matched {
            tracing::warn!(
                token = response.token,
                status = ?response.status,
                "dropping blobdb response with no pending request"
            );
        }
        matched
    }

    /// Abandon the request waiting on `token`; it resolves as cancelled.
    pub fn cancel(&self, token: u16) -> bool {
        self.pending.cancel(&token)
    }
}
