//! Typed Pebble protocol packets.
//!
//! Every packet is an endpoint id plus an ordered sequence of fields. The
//! field order per endpoint is part of the wire contract and lives in the
//! [`PacketPayload`] implementation of each packet type.
//!
//! [`PebblePacket`] is the closed set of packets this crate understands;
//! the [`PacketRegistry`] maps endpoint ids to the decoder that produces the
//! right variant for an inbound frame.

mod blobdb;
mod notification;
mod ping_pong;
mod registry;
mod timeline;

use std::fmt;

use bytes::Bytes;
use pebblelink_core::{ByteReader, ByteWriter, DecodeError};

use crate::error::ValidationError;
use crate::wire;

pub use blobdb::{
    BlobCommand, BlobCommandPacket, BlobDatabase, BlobOperation, BlobResponse, BlobStatus,
    MAX_KEY_SIZE, MAX_VALUE_SIZE,
};
pub use notification::{NotificationSource, PushNotification};
pub use ping_pong::PingPong;
pub use registry::{PacketDecoder, PacketRegistry};
pub use timeline::{
    TimelineAction, TimelineActionType, TimelineAttribute, TimelineAttributeId, TimelineItem,
    TimelineItemType, TimelineLayout,
};

/// Endpoint identifier carried in every frame header.
///
/// The set of endpoints is open: anything can appear on the wire, and only
/// those with a registered decoder are understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolEndpoint(u16);

impl ProtocolEndpoint {
    /// Ping/pong liveness checks.
    pub const PING: ProtocolEndpoint = ProtocolEndpoint(2001);

    /// BlobDB key/value synchronization.
    pub const BLOB_DB: ProtocolEndpoint = ProtocolEndpoint(0xB1DB);

    /// Wrap a raw endpoint id.
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// The raw endpoint id.
    pub const fn id(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ProtocolEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload layout of one packet type.
///
/// `encode` writes the fields after the frame header; `decode` reads them
/// back and must consume exactly what `encode` wrote.
pub trait PacketPayload: Sized {
    /// Endpoint this payload travels on.
    const ENDPOINT: ProtocolEndpoint;

    /// Append the payload fields to `writer`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a field cannot be represented.
    fn encode(&self, writer: &mut ByteWriter) -> Result<(), ValidationError>;

    /// Read the payload fields from `reader`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on truncated or invalid input.
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError>;
}

/// Serialize a payload into a complete frame.
pub(crate) fn encode_frame<P: PacketPayload>(payload: &P) -> Result<Bytes, ValidationError> {
    let mut writer = ByteWriter::new();
    payload.encode(&mut writer)?;
    wire::serialize_frame(P::ENDPOINT, writer.as_slice())
}

/// A decoded packet from any supported endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PebblePacket {
    /// Ping or pong on [`ProtocolEndpoint::PING`].
    PingPong(PingPong),
    /// Outbound BlobDB command on [`ProtocolEndpoint::BLOB_DB`].
    BlobCommand(BlobCommandPacket),
    /// Inbound BlobDB response on [`ProtocolEndpoint::BLOB_DB`].
    BlobResponse(BlobResponse),
}

impl PebblePacket {
    /// Endpoint this packet travels on.
    pub fn endpoint(&self) -> ProtocolEndpoint {
        match self {
            PebblePacket::PingPong(_) => PingPong::ENDPOINT,
            PebblePacket::BlobCommand(_) => BlobCommandPacket::ENDPOINT,
            PebblePacket::BlobResponse(_) => BlobResponse::ENDPOINT,
        }
    }

    /// Serialize into a complete frame (header + payload).
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the packet cannot be represented;
    /// no partial frame is produced.
    pub fn serialize(&self) -> Result<Bytes, ValidationError> {
        match self {
            PebblePacket::PingPong(p) => encode_frame(p),
            PebblePacket::BlobCommand(p) => encode_frame(p),
            PebblePacket::BlobResponse(p) => encode_frame(p),
        }
    }

    /// Decode a complete frame using `registry` to pick the variant.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEndpoint` for unregistered endpoints, and `Truncated`
    /// or `TrailingBytes` when the frame does not match its declared layout.
    pub fn deserialize(registry: &PacketRegistry, frame: &[u8]) -> Result<Self, DecodeError> {
        registry.decode_frame(frame)
    }
}

impl From<PingPong> for PebblePacket {
    fn from(packet: PingPong) -> Self {
        PebblePacket::PingPong(packet)
    }
}

impl From<BlobCommandPacket> for PebblePacket {
    fn from(packet: BlobCommandPacket) -> Self {
        PebblePacket::BlobCommand(packet)
    }
}

impl From<BlobResponse> for PebblePacket {
    fn from(packet: BlobResponse) -> Self {
        PebblePacket::BlobResponse(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_ids() {
        assert_eq!(ProtocolEndpoint::PING.id(), 0x07D1);
        assert_eq!(ProtocolEndpoint::BLOB_DB.id(), 45531);
        assert_eq!(ProtocolEndpoint::new(7).to_string(), "7");
    }

    #[test]
    fn test_packet_endpoint_matches_frame_header() {
        let packets: Vec<PebblePacket> = vec![
            PingPong::Ping { cookie: 1 }.into(),
            BlobResponse {
                token: 9,
                status: BlobStatus::Success,
            }
            .into(),
        ];

        for packet in packets {
            let frame = packet.serialize().expect("serialize");
            let (header, _) = wire::deserialize_frame(&frame).expect("frame");
            assert_eq!(header.endpoint, packet.endpoint());
        }
    }

    #[test]
    fn test_deserialize_inverts_serialize() {
        let registry = PacketRegistry::setup();
        let statuses = [
            BlobStatus::Success,
            BlobStatus::GeneralFailure,
            BlobStatus::InvalidOperation,
            BlobStatus::InvalidDatabaseId,
            BlobStatus::InvalidData,
            BlobStatus::KeyDoesNotExist,
            BlobStatus::DatabaseFull,
            BlobStatus::DataStale,
            BlobStatus::NotSupported,
            BlobStatus::Locked,
            BlobStatus::TryLater,
        ];

        let mut packets: Vec<PebblePacket> = vec![
            PingPong::Ping { cookie: 0 }.into(),
            PingPong::Ping { cookie: 1337 }.into(),
            PingPong::Pong { cookie: u32::MAX }.into(),
        ];
        packets.extend(statuses.iter().zip(1u16..).map(|(&status, token)| {
            PebblePacket::from(BlobResponse {
                token: token.wrapping_mul(0x1F01),
                status,
            })
        }));

        for packet in packets {
            let frame = packet.serialize().expect("serialize");
            assert_eq!(
                PebblePacket::deserialize(&registry, &frame),
                Ok(packet.clone()),
                "frame {frame:?}"
            );
        }
    }

    #[test]
    fn test_deserialize_rejects_unknown_and_malformed() {
        let registry = PacketRegistry::setup();
        assert_eq!(
            PebblePacket::deserialize(&registry, &[0x00, 0x01, 0x00, 0x10, 0xAA]),
            Err(DecodeError::UnknownEndpoint { endpoint: 0x0010 })
        );

        // Pong payload with one byte too many.
        assert_eq!(
            PebblePacket::deserialize(
                &registry,
                &[0x00, 0x06, 0x07, 0xD1, 0x01, 0x00, 0x00, 0x00, 0x01, 0xFF]
            ),
            Err(DecodeError::TrailingBytes { count: 1 })
        );
    }
}
