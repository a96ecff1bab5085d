//! Wire format for Pebble protocol frames.
//!
//! Frame format: `[length:2][endpoint:2][payload:N]`
//!
//! - **length**: Payload size in bytes, excluding the header (big-endian u16)
//! - **endpoint**: Destination endpoint id (big-endian u16)
//! - **payload**: Endpoint-specific fields, laid out by the packet type

use bytes::Bytes;
use pebblelink_core::{ByteReader, ByteWriter, DecodeError, Endian};

use crate::error::ValidationError;
use crate::packet::ProtocolEndpoint;

/// Header size: 2 (length) + 2 (endpoint) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Maximum payload size, bounded by the u16 length field.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Frame header preceding every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Payload length in bytes.
    pub length: u16,
    /// Endpoint the payload belongs to.
    pub endpoint: ProtocolEndpoint,
}

impl PacketHeader {
    /// Append the header to `writer`.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u16(self.length, Endian::Big);
        writer.write_u16(self.endpoint.id(), Endian::Big);
    }

    /// Read a header from the front of `reader`.
    ///
    /// # Errors
    ///
    /// Returns `Truncated` if fewer than [`HEADER_SIZE`] bytes remain.
    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let length = reader.read_u16(Endian::Big)?;
        let endpoint = ProtocolEndpoint::new(reader.read_u16(Endian::Big)?);
        Ok(Self { length, endpoint })
    }
}

/// Serialize a frame for `endpoint` carrying `payload`.
///
/// # Errors
///
/// Returns `PayloadTooLarge` if the payload does not fit the length field.
///
/// # Examples
///
/// ```
/// use pebblelink::{ProtocolEndpoint, deserialize_frame, serialize_frame};
///
/// let frame = serialize_frame(ProtocolEndpoint::PING, &[0x00, 0, 0, 5, 57]).expect("serialize");
/// assert_eq!(&frame[..4], &[0x00, 0x05, 0x07, 0xD1]);
///
/// let (header, payload) = deserialize_frame(&frame).expect("deserialize");
/// assert_eq!(header.endpoint, ProtocolEndpoint::PING);
/// assert_eq!(payload.len(), 5);
/// ```
pub fn serialize_frame(
    endpoint: ProtocolEndpoint,
    payload: &[u8],
) -> Result<Bytes, ValidationError> {
    let length = u16::try_from(payload.len()).map_err(|_| ValidationError::PayloadTooLarge {
        size: payload.len(),
        max: MAX_PAYLOAD_SIZE,
    })?;

    let mut writer = ByteWriter::with_capacity(HEADER_SIZE + payload.len());
    PacketHeader { length, endpoint }.write_to(&mut writer);
    writer.write_bytes(payload);
    Ok(writer.into_bytes())
}

/// Deserialize exactly one frame.
///
/// The input must hold the header and exactly `length` payload bytes.
///
/// # Errors
///
/// - `Truncated`: the header or payload is incomplete
/// - `TrailingBytes`: bytes follow the declared payload
pub fn deserialize_frame(data: &[u8]) -> Result<(PacketHeader, &[u8]), DecodeError> {
    let mut reader = ByteReader::new(data);
    let header = PacketHeader::read_from(&mut reader)?;
    let payload = reader.read_bytes(header.length as usize)?;
    reader.finish()?;
    Ok((header, payload))
}

/// Try to deserialize from a buffer that may contain partial data.
///
/// Used by byte-stream transports, where frames arrive split or coalesced.
///
/// # Returns
///
/// - `Some((header, payload, consumed))` if a complete frame was parsed
/// - `None` if more data is needed (not an error condition)
pub fn try_deserialize_frame(data: &[u8]) -> Option<(PacketHeader, &[u8], usize)> {
    let mut reader = ByteReader::new(data);
    let header = PacketHeader::read_from(&mut reader).ok()?;
    let payload = reader.read_bytes(header.length as usize).ok()?;
    Some((header, payload, reader.position()))
}
