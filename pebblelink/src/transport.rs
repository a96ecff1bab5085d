//! Outbound transport boundary.
//!
//! The protocol layer never owns a socket. It hands complete frames to a
//! [`PacketSink`] and receives inbound frames through an
//! [`InboundDispatcher`](crate::InboundDispatcher).

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Developer-connection frame type for a relayed watch frame.
pub const RELAY_FRAME_TYPE: u8 = 0x01;

/// Destination for serialized frames.
#[async_trait]
pub trait PacketSink: Send + Sync {
    /// Hand one complete frame to the transport.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the frame was not accepted.
    async fn send(&self, frame: Bytes) -> Result<(), TransportError>;
}

#[async_trait]
impl<F> PacketSink for F
where
    F: Fn(Bytes) -> Result<(), TransportError> + Send + Sync,
{
    async fn send(&self, frame: Bytes) -> Result<(), TransportError> {
        self(frame)
    }
}

/// Sink that forwards frames into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<Bytes>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes its frames.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl PacketSink for ChannelSink {
    async fn send(&self, frame: Bytes) -> Result<(), TransportError> {
        self.sender.send(frame).map_err(|_| TransportError::Closed)
    }
}

/// Wraps frames in the developer-connection relay envelope before sending.
#[derive(Debug, Clone)]
pub struct DevConnectionSink<S> {
    inner: S,
}

impl<S> DevConnectionSink<S> {
    /// Relay frames through `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// The wrapped sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: PacketSink> PacketSink for DevConnectionSink<S> {
    async fn send(&self, frame: Bytes) -> Result<(), TransportError> {
        let mut relayed = BytesMut::with_capacity(frame.len() + 1);
        relayed.put_u8(RELAY_FRAME_TYPE);
        relayed.put_slice(&frame);
        self.inner.send(relayed.freeze()).await
    }
}

/// Strip the relay envelope from a developer-connection message.
///
/// Returns `None` for other message types, which carry no watch frame.
pub fn unwrap_relay(message: &[u8]) -> Option<&[u8]> {
    match message.split_first() {
        Some((&RELAY_FRAME_TYPE, frame)) => Some(frame),
        _ => None,
    }
}
