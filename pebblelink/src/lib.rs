//! # Pebblelink Protocol Layer
//!
//! Phone-side implementation of the Pebble smartwatch protocol.
//!
//! This crate provides:
//! - **Wire format**: length/endpoint framed packets
//! - **Packets**: typed payloads and a registry decoding inbound frames
//! - **Correlation**: pending-request table with per-request timeouts
//! - **Services**: BlobDB commands, notifications, ping
//! - **Dispatch**: a single inbound loop routing frames to their waiters
//!
//! The transport itself (Bluetooth, developer connection) stays outside:
//! outbound frames go to a [`PacketSink`], inbound frames are fed to an
//! [`InboundDispatcher`].

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export core types for convenience
pub use pebblelink_core::{
    ByteReader, ByteWriter, DecodeError, EncodeError, Endian, RandomProvider,
    SeededRandomProvider, TimeError, TimeProvider, TokioRandomProvider, TokioTimeProvider,
};

// =============================================================================
// Modules
// =============================================================================

/// Error types for protocol operations.
pub mod error;

/// Frame header and framing functions.
pub mod wire;

/// Typed packets and the packet registry.
pub mod packet;

/// Request/response correlation primitives.
pub mod rpc;

/// BlobDB, notification and ping services.
pub mod services;

/// Inbound frame routing.
pub mod dispatcher;

/// Outbound sinks and developer-connection framing.
pub mod transport;

/// Protocol timeouts and queue sizes.
pub mod config;

/// Wired-up client context.
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

// Error exports
pub use error::{ProtocolError, RegistryError, TransportError, ValidationError};

// Wire format exports
pub use wire::{
    HEADER_SIZE, MAX_PAYLOAD_SIZE, PacketHeader, deserialize_frame, serialize_frame,
    try_deserialize_frame,
};

// Packet exports
pub use packet::{
    BlobCommand, BlobCommandPacket, BlobDatabase, BlobOperation, BlobResponse, BlobStatus,
    MAX_KEY_SIZE, MAX_VALUE_SIZE, NotificationSource, PacketDecoder, PacketPayload,
    PacketRegistry, PebblePacket, PingPong, ProtocolEndpoint, PushNotification, TimelineAction,
    TimelineActionType, TimelineAttribute, TimelineAttributeId, TimelineItem, TimelineItemType,
    TimelineLayout,
};

// RPC exports
pub use rpc::{PendingRequests, ReplyError, ReplyFuture, ReplyPromise};

// Service exports
pub use services::{BlobDbService, NotificationService, PingService};

// Dispatch and client exports
pub use client::{ClientParts, PebbleClient};
pub use config::ProtocolConfig;
pub use dispatcher::{Dispatch, InboundDispatcher};
pub use transport::{
    ChannelSink, DevConnectionSink, PacketSink, RELAY_FRAME_TYPE, unwrap_relay,
};
