//! Ping/pong liveness checks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pebblelink_core::{TimeProvider, TokioTimeProvider};

use crate::error::ProtocolError;
use crate::packet::{PingPong, encode_frame};
use crate::rpc::PendingRequests;
use crate::transport::PacketSink;

/// Sends pings correlated by cookie and answers the watch's pings.
#[derive(Clone)]
pub struct PingService<TP = TokioTimeProvider> {
    sink: Arc<dyn PacketSink>,
    pending: PendingRequests<u32, u32, TP>,
    timeout: Duration,
}

impl<TP> fmt::Debug for PingService<TP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PingService")
            .field("pending", &self.pending)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<TP: TimeProvider> PingService<TP> {
    /// Create a service sending through `sink`.
    pub fn new(sink: Arc<dyn PacketSink>, time: TP, timeout: Duration) -> Self {
        Self {
            sink,
            pending: PendingRequests::new(time),
            timeout,
        }
    }

    /// Ping the watch and wait for the pong echoing `cookie`.
    ///
    /// Returns the echoed cookie.
    ///
    /// # Errors
    ///
    /// - `Reply(DuplicateKey)` if a ping with `cookie` is already in flight
    /// - `Transport` when the sink refuses the frame
    /// - `Reply(Timeout)` when no pong arrives within the timeout
    pub async fn ping(&self, cookie: u32) -> Result<u32, ProtocolError> {
        let reply = self.pending.register(cookie)?;
        let frame = encode_frame(&PingPong::Ping { cookie })?;
        tracing::debug!(cookie, "sending ping");
        self.sink.send(frame).await?;
        Ok(reply.await_result(self.timeout).await?)
    }

    /// Resolve the ping waiting on `cookie`. Returns whether one was waiting.
    pub fn handle_pong(&self, cookie: u32) -> bool {
        let matched = self.pending.complete(&cookie, cookie);
        if !matched {
            tracing::warn!(cookie, "dropping pong with no pending ping");
        }
        matched
    }

    /// Answer an inbound ping with a pong carrying the same cookie.
    ///
    /// # Errors
    ///
    /// Returns `Transport` when the sink refuses the frame.
    pub async fn respond(&self, cookie: u32) -> Result<(), ProtocolError> {
        let frame = encode_frame(&PingPong::Pong { cookie })?;
        tracing::trace!(cookie, "answering ping");
        self.sink.send(frame).await?;
        Ok(())
    }
}
