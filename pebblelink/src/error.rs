//! Error types for the pebblelink protocol layer.

use pebblelink_core::{DecodeError, EncodeError};

use crate::packet::ProtocolEndpoint;
use crate::rpc::ReplyError;

/// A field or payload cannot be represented on the wire.
///
/// Raised before any bytes reach the transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A length-prefixed field exceeds its prefix width.
    #[error(transparent)]
    FieldTooLong(#[from] EncodeError),

    /// A field that must carry data is empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the empty field.
        field: &'static str,
    },

    /// The encoded payload does not fit a single frame.
    #[error("payload is {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Encoded payload size.
        size: usize,
        /// Largest payload a frame can carry.
        max: usize,
    },
}

/// Failures reported by a [`PacketSink`](crate::PacketSink).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection is closed and cannot accept frames.
    #[error("transport closed")]
    Closed,

    /// The frame could not be written.
    #[error("send failed: {message}")]
    SendFailed {
        /// Details about the failure.
        message: String,
    },
}

/// Errors raised while building a [`PacketRegistry`](crate::PacketRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A decoder is already registered for the endpoint.
    #[error("endpoint {endpoint} already registered")]
    AlreadyRegistered {
        /// The endpoint that was registered twice.
        endpoint: ProtocolEndpoint,
    },
}

/// Errors surfaced to callers of the protocol services.
///
/// A non-success BlobDB status is not an error at this level: it is returned
/// as the request's result so callers can match on it directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Inbound bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Outbound data failed validation; nothing was sent.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The transport refused the frame.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request did not resolve with a response.
    #[error("reply error: {0}")]
    Reply(#[from] ReplyError),
}

impl ProtocolError {
    /// Whether the request ran out of time waiting for a response.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProtocolError::Reply(ReplyError::Timeout))
    }
}

impl From<EncodeError> for ProtocolError {
    fn from(err: EncodeError) -> Self {
        ProtocolError::Validation(err.into())
    }
}
