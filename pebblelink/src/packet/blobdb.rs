//! BlobDB endpoint packets.
//!
//! Command payload (phone → watch):
//!
//! ```text
//! [command:1][token:2 LE][database:1]
//!   Insert: [key_len:1][key][value_len:2 LE][value]
//!   Delete: [key_len:1][key]
//!   Clear:  (nothing)
//! ```
//!
//! Response payload (watch → phone): `[token:2 LE][status:1]`

use bytes::Bytes;
use pebblelink_core::{ByteReader, ByteWriter, DecodeError, EncodeError, Endian};

use super::{PacketPayload, ProtocolEndpoint};
use crate::error::ValidationError;
use crate::wire::MAX_PAYLOAD_SIZE;

/// Largest key a command can carry (one-byte length prefix).
pub const MAX_KEY_SIZE: usize = u8::MAX as usize;

/// Command byte + token + database selector.
const COMMAND_HEADER_SIZE: usize = 4;

/// Largest value an insert can carry: what is left of one frame after the
/// command header, a one-byte key and both length prefixes. A longer key
/// leaves correspondingly less room, which `validate` reports as
/// `PayloadTooLarge`.
pub const MAX_VALUE_SIZE: usize = MAX_PAYLOAD_SIZE - COMMAND_HEADER_SIZE - 1 - 1 - 2;

/// Logical databases on the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlobDatabase {
    /// Scratch database used by firmware tests.
    Test = 0,
    /// Timeline pins.
    Pin = 1,
    /// Installed application metadata.
    App = 2,
    /// Timeline reminders.
    Reminder = 3,
    /// Pending notifications.
    Notification = 4,
    /// Weather locations and forecasts.
    Weather = 5,
    /// Canned replies for actionable notifications.
    CannedResponses = 6,
    /// Health tracking parameters.
    HealthParams = 7,
    /// Contacts.
    Contacts = 8,
    /// Per-app configuration.
    AppConfigs = 9,
    /// Health statistics.
    HealthStats = 10,
    /// App glance slices.
    AppGlance = 11,
}

impl TryFrom<u8> for BlobDatabase {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => BlobDatabase::Test,
            1 => BlobDatabase::Pin,
            2 => BlobDatabase::App,
            3 => BlobDatabase::Reminder,
            4 => BlobDatabase::Notification,
            5 => BlobDatabase::Weather,
            6 => BlobDatabase::CannedResponses,
            7 => BlobDatabase::HealthParams,
            8 => BlobDatabase::Contacts,
            9 => BlobDatabase::AppConfigs,
            10 => BlobDatabase::HealthStats,
            11 => BlobDatabase::AppGlance,
            other => {
                return Err(DecodeError::InvalidValue {
                    field: "blobdb database",
                    value: other as u32,
                });
            }
        })
    }
}

/// BlobDB command opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlobOperation {
    /// Insert or replace a key.
    Insert = 0x01,
    /// Remove a key.
    Delete = 0x04,
    /// Remove every key in a database.
    Clear = 0x05,
}

impl TryFrom<u8> for BlobOperation {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(BlobOperation::Insert),
            0x04 => Ok(BlobOperation::Delete),
            0x05 => Ok(BlobOperation::Clear),
            other => Err(DecodeError::InvalidValue {
                field: "blobdb command",
                value: other as u32,
            }),
        }
    }
}

/// Outcome reported by the watch for one command.
///
/// This is a closed set; unknown codes fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlobStatus {
    /// The command was applied.
    Success = 0x01,
    /// Unspecified failure.
    GeneralFailure = 0x02,
    /// The opcode is not valid for this database.
    InvalidOperation = 0x03,
    /// The database selector is unknown to the firmware.
    InvalidDatabaseId = 0x04,
    /// The key or value was malformed.
    InvalidData = 0x05,
    /// Delete targeted a missing key.
    KeyDoesNotExist = 0x06,
    /// No room left in the database.
    DatabaseFull = 0x07,
    /// The watch holds newer data.
    DataStale = 0x08,
    /// The database does not support the operation.
    NotSupported = 0x09,
    /// The database is locked by another operation.
    Locked = 0x0A,
    /// The watch is busy; retrying later may succeed.
    TryLater = 0x0B,
}

impl BlobStatus {
    /// Whether the command was applied.
    pub fn is_success(self) -> bool {
        self == BlobStatus::Success
    }
}

impl TryFrom<u8> for BlobStatus {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => BlobStatus::Success,
            0x02 => BlobStatus::GeneralFailure,
            0x03 => BlobStatus::InvalidOperation,
            0x04 => BlobStatus::InvalidDatabaseId,
            0x05 => BlobStatus::InvalidData,
            0x06 => BlobStatus::KeyDoesNotExist,
            0x07 => BlobStatus::DatabaseFull,
            0x08 => BlobStatus::DataStale,
            0x09 => BlobStatus::NotSupported,
            0x0A => BlobStatus::Locked,
            0x0B => BlobStatus::TryLater,
            other => {
                return Err(DecodeError::InvalidValue {
                    field: "blobdb status",
                    value: other as u32,
                });
            }
        })
    }
}

/// A BlobDB operation addressed to one database.
///
/// Keys are present for insert and delete, values only for insert, so an
/// ill-formed combination cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobCommand {
    /// Insert or replace `key` with `value`.
    Insert {
        /// Target database.
        database: BlobDatabase,
        /// Key, 1 to [`MAX_KEY_SIZE`] bytes.
        key: Bytes,
        /// Value, up to [`MAX_VALUE_SIZE`] bytes minus any key bytes past
        /// the first.
        value: Bytes,
    },
    /// Remove `key`.
    Delete {
        /// Target database.
        database: BlobDatabase,
        /// Key, 1 to [`MAX_KEY_SIZE`] bytes.
        key: Bytes,
    },
    /// Remove every key.
    Clear {
        /// Target database.
        database: BlobDatabase,
    },
}

impl BlobCommand {
    /// Build an insert command.
    pub fn insert(database: BlobDatabase, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        BlobCommand::Insert {
            database,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Build a delete command.
    pub fn delete(database: BlobDatabase, key: impl Into<Bytes>) -> Self {
        BlobCommand::Delete {
            database,
            key: key.into(),
        }
    }

    /// Build a clear command.
    pub fn clear(database: BlobDatabase) -> Self {
        BlobCommand::Clear { database }
    }

    /// Opcode of this command.
    pub fn operation(&self) -> BlobOperation {
        match self {
            BlobCommand::Insert { .. } => BlobOperation::Insert,
            BlobCommand::Delete { .. } => BlobOperation::Delete,
            BlobCommand::Clear { .. } => BlobOperation::Clear,
        }
    }

    /// Target database.
    pub fn database(&self) -> BlobDatabase {
        match self {
            BlobCommand::Insert { database, .. }
            | BlobCommand::Delete { database, .. }
            | BlobCommand::Clear { database } => *database,
        }
    }

    /// Key, if the operation carries one.
    pub fn key(&self) -> Option<&Bytes> {
        match self {
            BlobCommand::Insert { key, .. } | BlobCommand::Delete { key, .. } => Some(key),
            BlobCommand::Clear { .. } => None,
        }
    }

    fn encoded_len(&self) -> usize {
        COMMAND_HEADER_SIZE
            + match self {
                BlobCommand::Insert { key, value, .. } => 1 + key.len() + 2 + value.len(),
                BlobCommand::Delete { key, .. } => 1 + key.len(),
                BlobCommand::Clear { .. } => 0,
            }
    }

    /// Check that the command fits the wire format.
    ///
    /// # Errors
    ///
    /// - `Empty` if the key is empty
    /// - `FieldTooLong` if the key or value exceeds its length prefix
    /// - `PayloadTooLarge` if the whole command exceeds one frame
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = self.key() {
            if key.is_empty() {
                return Err(ValidationError::Empty { field: "key" });
            }
            if key.len() > MAX_KEY_SIZE {
                return Err(EncodeError::FieldTooLong {
                    field: "key",
                    len: key.len(),
                    max: MAX_KEY_SIZE,
                }
                .into());
            }
        }
        if let BlobCommand::Insert { value, .. } = self
            && value.len() > MAX_VALUE_SIZE
        {
            return Err(EncodeError::FieldTooLong {
                field: "value",
                len: value.len(),
                max: MAX_VALUE_SIZE,
            }
            .into());
        }
        let size = self.encoded_len();
        if size > MAX_PAYLOAD_SIZE {
            return Err(ValidationError::PayloadTooLarge {
                size,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(())
    }
}

/// A command paired with the correlation token its response will echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobCommandPacket {
    /// Correlation token.
    pub token: u16,
    /// The operation.
    pub command: BlobCommand,
}

impl PacketPayload for BlobCommandPacket {
    const ENDPOINT: ProtocolEndpoint = ProtocolEndpoint::BLOB_DB;

    fn encode(&self, writer: &mut ByteWriter) -> Result<(), ValidationError> {
        self.command.validate()?;

        writer.write_u8(self.command.operation() as u8);
        writer.write_u16(self.token, Endian::Little);
        writer.write_u8(self.command.database() as u8);
        match &self.command {
            BlobCommand::Insert { key, value, .. } => {
                writer.write_prefixed_u8("key", key)?;
                writer.write_prefixed_u16("value", value, Endian::Little)?;
            }
            BlobCommand::Delete { key, .. } => {
                writer.write_prefixed_u8("key", key)?;
            }
            BlobCommand::Clear { .. } => {}
        }
        Ok(())
    }

    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let operation = BlobOperation::try_from(reader.read_u8()?)?;
        let token = reader.read_u16(Endian::Little)?;
        let database = BlobDatabase::try_from(reader.read_u8()?)?;
        let command = match operation {
            BlobOperation::Insert => {
                let key = Bytes::copy_from_slice(reader.read_prefixed_u8()?);
                let value = Bytes::copy_from_slice(reader.read_prefixed_u16(Endian::Little)?);
                BlobCommand::Insert {
                    database,
                    key,
                    value,
                }
            }
            BlobOperation::Delete => BlobCommand::Delete {
                database,
                key: Bytes::copy_from_slice(reader.read_prefixed_u8()?),
            },
            BlobOperation::Clear => BlobCommand::Clear { database },
        };
        Ok(Self { token, command })
    }
}

/// The watch's answer to a command, matched by token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobResponse {
    /// Token of the command being answered.
    pub token: u16,
    /// Outcome of the command.
    pub status: BlobStatus,
}

impl PacketPayload for BlobResponse {
    const ENDPOINT: ProtocolEndpoint = ProtocolEndpoint::BLOB_DB;

    fn encode(&self, writer: &mut ByteWriter) -> Result<(), ValidationError> {
        writer.write_u16(self.token, Endian::Little);
        writer.write_u8(self.status as u8);
        Ok(())
    }

    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let token = reader.read_u16(Endian::Little)?;
        let status = BlobStatus::try_from(reader.read_u8()?)?;
        Ok(Self { token, status })
    }
}
