//! Inbound frame dispatch.
//!
//! The dispatcher is the single reader of inbound frames. It decodes each
//! frame once and routes it to exactly one destination: a waiting request,
//! an automatic reply, or the unsolicited channel. Routing never waits on
//! the outbound sink.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use pebblelink_core::{DecodeError, RandomProvider, TimeProvider};
use tokio::sync::mpsc;

use crate::packet::{PacketRegistry, PebblePacket, PingPong};
use crate::services::{BlobDbService, PingService};

/// Where an inbound frame ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A BlobDB response; `matched` when a request was waiting on its token.
    BlobResponse {
        /// Whether a pending request was resolved.
        matched: bool,
    },
    /// A pong; `matched` when a ping was waiting on its cookie.
    Pong {
        /// Whether a pending ping was resolved.
        matched: bool,
    },
    /// A ping from the watch, answered with a pong.
    PingAnswered,
    /// A packet nothing was waiting for, forwarded to the unsolicited channel.
    Unsolicited,
}

/// Routes decoded inbound packets to the services waiting on them.
pub struct InboundDispatcher<TP, R> {
    registry: Arc<PacketRegistry>,
    blobdb: BlobDbService<TP, R>,
    ping: PingService<TP>,
    unsolicited: mpsc::UnboundedSender<PebblePacket>,
}

impl<TP, R> fmt::Debug for InboundDispatcher<TP, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundDispatcher")
            .field("endpoints", &self.registry.endpoints())
            .finish_non_exhaustive()
    }
}

impl<TP: TimeProvider, R: RandomProvider> InboundDispatcher<TP, R> {
    /// Create a dispatcher over `registry`, forwarding unmatched packets to
    /// `unsolicited`.
    pub fn new(
        registry: Arc<PacketRegistry>,
        blobdb: BlobDbService<TP, R>,
        ping: PingService<TP>,
        unsolicited: mpsc::UnboundedSender<PebblePacket>,
    ) -> Self {
        Self {
            registry,
            blobdb,
            ping,
            unsolicited,
        }
    }

    fn forward(&self, packet: PebblePacket) {
        tracing::debug!(endpoint = %packet.endpoint(), "unsolicited packet");
        if self.unsolicited.send(packet).is_err() {
            tracing::trace!("unsolicited receiver gone, packet dropped");
        }
    }

    /// Decode one frame and route it.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the frame is malformed or its endpoint
    /// has no decoder. Nothing is routed in that case.
    pub fn dispatch(&self, frame: &[u8]) -> Result<Dispatch, DecodeError> {
        let packet = self.registry.decode_frame(frame)?;
        tracing::trace!(endpoint = %packet.endpoint(), len = frame.len(), "inbound frame");

        let outcome = match packet {
            PebblePacket::BlobResponse(response) => {
                let matched = self.blobdb.handle_response(response);
                if !matched {
                    self.forward(packet);
                }
                Dispatch::BlobResponse { matched }
            }
            PebblePacket::PingPong(PingPong::Pong { cookie }) => {
                let matched = self.ping.handle_pong(cookie);
                if !matched {
                    self.forward(packet);
                }
                Dispatch::Pong { matched }
            }
            PebblePacket::PingPong(PingPong::Ping { cookie }) => {
                // The sink may apply backpressure; the reply must not hold up
                // the frames behind this one.
                let ping = self.ping.clone();
                tokio::spawn(async move {
                    if let Err(err) = ping.respond(cookie).await {
                        tracing::warn!(cookie, error = %err, "failed to answer ping");
                    }
                });
                Dispatch::PingAnswered
            }
            other => {
                self.forward(other);
                Dispatch::Unsolicited
            }
        };
        Ok(outcome)
    }

    /// Dispatch frames from `inbound` until the channel closes.
    ///
    /// Undecodable frames are logged and skipped.
    pub async fn run(self, mut inbound: mpsc::Receiver<Bytes>) {
        while let Some(frame) = inbound.recv().await {
            if let Err(err) = self.dispatch(&frame) {
                tracing::warn!(error = %err, len = frame.len(), "dropping undecodable frame");
            }
        }
        tracing::debug!("inbound channel closed, dispatcher stopping");
    }
}
