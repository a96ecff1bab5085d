//! Ping endpoint packets.
//!
//! Payload: `[command:1][cookie:4 BE]`, command 0 = ping, 1 = pong.

use pebblelink_core::{ByteReader, ByteWriter, DecodeError, Endian};

use super::{PacketPayload, ProtocolEndpoint};
use crate::error::ValidationError;

const COMMAND_PING: u8 = 0x00;
const COMMAND_PONG: u8 = 0x01;

/// Liveness probe and its echo.
///
/// A pong answers the ping carrying the same cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingPong {
    /// Request an echo of `cookie`.
    Ping {
        /// Opaque value echoed by the peer.
        cookie: u32,
    },
    /// Echo of a previous ping.
    Pong {
        /// The cookie from the matching ping.
        cookie: u32,
    },
}

impl PingPong {
    /// Cookie carried by either direction.
    pub fn cookie(&self) -> u32 {
        match *self {
            PingPong::Ping { cookie } | PingPong::Pong { cookie } => cookie,
        }
    }
}

impl PacketPayload for PingPong {
    const ENDPOINT: ProtocolEndpoint = ProtocolEndpoint::PING;

    fn encode(&self, writer: &mut ByteWriter) -> Result<(), ValidationError> {
        let command = match self {
            PingPong::Ping { .. } => COMMAND_PING,
            PingPong::Pong { .. } => COMMAND_PONG,
        };
        writer.write_u8(command);
        writer.write_u32(self.cookie(), Endian::Big);
        Ok(())
    }

    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let command = reader.read_u8()?;
        let cookie = reader.read_u32(Endian::Big)?;
        match command {
            COMMAND_PING => Ok(PingPong::Ping { cookie }),
            COMMAND_PONG => Ok(PingPong::Pong { cookie }),
            other => Err(DecodeError::InvalidValue {
                field: "ping command",
                value: other as u32,
            }),
        }
    }
}
