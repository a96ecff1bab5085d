//! PacketRegistry: endpoint id → decoder routing.
//!
//! Built once at client construction and shared read-only afterwards.

use std::collections::HashMap;

use pebblelink_core::{ByteReader, DecodeError};

use super::{BlobResponse, PacketPayload, PebblePacket, PingPong, ProtocolEndpoint};
use crate::error::RegistryError;
use crate::wire;

/// Decodes an endpoint's payload into a [`PebblePacket`].
pub type PacketDecoder = fn(&mut ByteReader<'_>) -> Result<PebblePacket, DecodeError>;

fn decode_as<P>(reader: &mut ByteReader<'_>) -> Result<PebblePacket, DecodeError>
where
    P: PacketPayload + Into<PebblePacket>,
{
    P::decode(reader).map(Into::into)
}

/// Maps endpoint ids to payload decoders.
///
/// # Design
///
/// - At most one decoder per endpoint.
/// - [`register_defaults`](Self::register_defaults) may run any number of
///   times; repeated runs overwrite rather than duplicate.
/// - Lookups never mutate, so a built registry can sit behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PacketRegistry {
    decoders: HashMap<ProtocolEndpoint, PacketDecoder>,
}

impl PacketRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in packet type registered.
    pub fn setup() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Register the built-in packet types.
    ///
    /// The BlobDB endpoint decodes the watch's responses, the direction a
    /// phone-side client receives.
    pub fn register_defaults(&mut self) {
        self.decoders
            .insert(ProtocolEndpoint::PING, decode_as::<PingPong>);
        self.decoders
            .insert(ProtocolEndpoint::BLOB_DB, decode_as::<BlobResponse>);
        tracing::trace!(endpoints = self.decoders.len(), "default decoders registered");
    }

    /// Register a decoder for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if the endpoint already has a decoder.
    pub fn register(
        &mut self,
        endpoint: ProtocolEndpoint,
        decoder: PacketDecoder,
    ) -> Result<(), RegistryError> {
        if self.decoders.contains_key(&endpoint) {
            return Err(RegistryError::AlreadyRegistered { endpoint });
        }
        self.decoders.insert(endpoint, decoder);
        Ok(())
    }

    /// Register the decoder of a [`PacketPayload`] type on its endpoint.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if the endpoint already has a decoder.
    pub fn register_payload<P>(&mut self) -> Result<(), RegistryError>
    where
        P: PacketPayload + Into<PebblePacket>,
    {
        self.register(P::ENDPOINT, decode_as::<P>)
    }

    /// Whether `endpoint` has a decoder.
    pub fn contains(&self, endpoint: ProtocolEndpoint) -> bool {
        self.decoders.contains_key(&endpoint)
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Whether no endpoint is registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Registered endpoints in ascending order.
    pub fn endpoints(&self) -> Vec<ProtocolEndpoint> {
        let mut endpoints: Vec<_> = self.decoders.keys().copied().collect();
        endpoints.sort();
        endpoints
    }

    /// Decode a frame payload for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEndpoint` when no decoder is registered, and the
    /// decoder's error (or `TrailingBytes`) when the payload is malformed.
    pub fn decode(
        &self,
        endpoint: ProtocolEndpoint,
        payload: &[u8],
    ) -> Result<PebblePacket, DecodeError> {
        let decoder = self
            .decoders
            .get(&endpoint)
            .ok_or(DecodeError::UnknownEndpoint {
                endpoint: endpoint.id(),
            })?;
        let mut reader = ByteReader::new(payload);
        let packet = decoder(&mut reader)?;
        reader.finish()?;
        Ok(packet)
    }

    /// Decode a complete frame (header + payload).
    ///
    /// # Errors
    ///
    /// Fails on a malformed header, a length mismatch, or any
    /// [`decode`](Self::decode) error.
    pub fn decode_frame(&self, frame: &[u8]) -> Result<PebblePacket, DecodeError> {
        let (header, payload) = wire::deserialize_frame(frame)?;
        self.decode(header.endpoint, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::BlobStatus;

    #[test]
    fn test_setup_registers_builtin_endpoints() {
        let registry = PacketRegistry::setup();
        assert_eq!(
            registry.endpoints(),
            vec![ProtocolEndpoint::PING, ProtocolEndpoint::BLOB_DB]
        );
    }

    #[test]
    fn test_register_defaults_is_idempotent() {
        let mut registry = PacketRegistry::setup();
        registry.register_defaults();
        registry.register_defaults();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = PacketRegistry::new();
        assert!(registry.is_empty());
        registry.register_payload::<PingPong>().expect("first");
        assert_eq!(
            registry.register_payload::<PingPong>(),
            Err(RegistryError::AlreadyRegistered {
                endpoint: ProtocolEndpoint::PING
            })
        );
    }

    #[test]
    fn test_unknown_endpoint() {
        let registry = PacketRegistry::setup();
        assert_eq!(
            registry.decode(ProtocolEndpoint::new(0x1234), &[]),
            Err(DecodeError::UnknownEndpoint { endpoint: 0x1234 })
        );
    }

    #[test]
    fn test_decode_rejects_trailing_payload() {
        let registry = PacketRegistry::setup();
        let result = registry.decode(ProtocolEndpoint::BLOB_DB, &[0x01, 0x00, 0x01, 0xAA]);
        assert_eq!(result, Err(DecodeError::TrailingBytes { count: 1 }));
    }

    #[test]
    fn test_decode_frame_blob_response() {
        let registry = PacketRegistry::setup();
        let frame = [0x00, 0x03, 0xB1, 0xDB, 0x34, 0x12, 0x01];
        assert_eq!(
            registry.decode_frame(&frame),
            Ok(PebblePacket::BlobResponse(BlobResponse {
                token: 0x1234,
                status: BlobStatus::Success,
            }))
        );
    }
}
