//! Timeline items: the value format stored in the pin, reminder and
//! notification databases.
//!
//! ```text
//! [item_id:16][parent_id:16][timestamp:4 LE][duration:2 LE][type:1]
//! [flags:2 LE][layout:1][data_length:2 LE][attribute_count:1][action_count:1]
//! attributes: [id:1][length:2 LE][content]
//! actions:    [id:1][type:1][attribute_count:1][attributes...]
//! ```
//!
//! `data_length` covers the attribute and action sections only.

use bytes::Bytes;
use pebblelink_core::{ByteReader, ByteWriter, DecodeError, EncodeError, Endian};
use uuid::Uuid;

use crate::error::ValidationError;

/// Kind of timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimelineItemType {
    /// Transient notification.
    Notification = 1,
    /// Pin shown on the timeline.
    Pin = 2,
    /// Reminder attached to a pin.
    Reminder = 3,
}

impl TryFrom<u8> for TimelineItemType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TimelineItemType::Notification),
            2 => Ok(TimelineItemType::Pin),
            3 => Ok(TimelineItemType::Reminder),
            other => Err(DecodeError::InvalidValue {
                field: "timeline item type",
                value: other as u32,
            }),
        }
    }
}

/// Layout the firmware renders the item with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimelineLayout {
    /// Plain pin.
    GenericPin = 0x01,
    /// Calendar event pin.
    CalendarPin = 0x02,
    /// Plain reminder.
    GenericReminder = 0x03,
    /// Plain notification.
    GenericNotification = 0x04,
    /// Communication (message) notification.
    CommNotification = 0x05,
    /// Weather pin.
    WeatherPin = 0x06,
    /// Sports score pin.
    SportsPin = 0x07,
}

impl TryFrom<u8> for TimelineLayout {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => TimelineLayout::GenericPin,
            0x02 => TimelineLayout::CalendarPin,
            0x03 => TimelineLayout::GenericReminder,
            0x04 => TimelineLayout::GenericNotification,
            0x05 => TimelineLayout::CommNotification,
            0x06 => TimelineLayout::WeatherPin,
            0x07 => TimelineLayout::SportsPin,
            other => {
                return Err(DecodeError::InvalidValue {
                    field: "timeline layout",
                    value: other as u32,
                });
            }
        })
    }
}

/// Attribute identifier. Open set: unknown ids decode unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineAttributeId(pub u8);

impl TimelineAttributeId {
    /// Headline text.
    pub const TITLE: Self = Self(0x01);
    /// Secondary line.
    pub const SUBTITLE: Self = Self(0x02);
    /// Main text.
    pub const BODY: Self = Self(0x03);
    /// Small icon resource id (u32 LE).
    pub const TINY_ICON: Self = Self(0x04);
    /// Background color (one byte, 8-bit ARGB).
    pub const BACKGROUND_COLOR: Self = Self(0x1C);
}

/// Action kind. Open set: unknown kinds decode unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineActionType(pub u8);

impl TimelineActionType {
    /// Dismiss through the iOS notification center.
    pub const ANCS_DISMISS: Self = Self(0x01);
    /// Application-defined action.
    pub const GENERIC: Self = Self(0x02);
    /// Reply with text.
    pub const RESPONSE: Self = Self(0x03);
    /// Dismiss the item.
    pub const DISMISS: Self = Self(0x04);
}

/// One typed attribute of an item or action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineAttribute {
    /// Attribute identifier.
    pub id: TimelineAttributeId,
    /// Raw attribute content.
    pub content: Bytes,
}

impl TimelineAttribute {
    /// UTF-8 text attribute.
    pub fn text(id: TimelineAttributeId, text: &str) -> Self {
        Self {
            id,
            content: Bytes::copy_from_slice(text.as_bytes()),
        }
    }

    /// Little-endian u32 attribute.
    pub fn uint32(id: TimelineAttributeId, value: u32) -> Self {
        Self {
            id,
            content: Bytes::copy_from_slice(&value.to_le_bytes()),
        }
    }

    /// Single-byte attribute.
    pub fn uint8(id: TimelineAttributeId, value: u8) -> Self {
        Self {
            id,
            content: Bytes::copy_from_slice(&[value]),
        }
    }

    /// Content as text, if valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Content as a little-endian u32, if exactly four bytes.
    pub fn as_u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.content.as_ref().try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    fn write_to(&self, writer: &mut ByteWriter) -> Result<(), EncodeError> {
        writer.write_u8(self.id.0);
        writer.write_prefixed_u16("timeline attribute", &self.content, Endian::Little)
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let id = TimelineAttributeId(reader.read_u8()?);
        let content = Bytes::copy_from_slice(reader.read_prefixed_u16(Endian::Little)?);
        Ok(Self { id, content })
    }
}

/// A user action attached to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineAction {
    /// Action identifier, unique within the item.
    pub id: u8,
    /// Action kind.
    pub action_type: TimelineActionType,
    /// Attributes such as the action's title.
    pub attributes: Vec<TimelineAttribute>,
}

impl TimelineAction {
    /// The standard "Dismiss" action.
    pub fn dismiss(id: u8) -> Self {
        Self {
            id,
            action_type: TimelineActionType::DISMISS,
            attributes: vec![TimelineAttribute::text(
                TimelineAttributeId::TITLE,
                "Dismiss",
            )],
        }
    }
}

/// A timeline entry as stored in BlobDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineItem {
    /// Unique id; also the BlobDB key.
    pub item_id: Uuid,
    /// Owning item or application, nil for standalone items.
    pub parent_id: Uuid,
    /// Seconds since the Unix epoch.
    pub timestamp: u32,
    /// Duration in minutes.
    pub duration: u16,
    /// Kind of entry.
    pub item_type: TimelineItemType,
    /// Firmware flags.
    pub flags: u16,
    /// Rendering layout.
    pub layout: TimelineLayout,
    /// Item attributes, in wire order.
    pub attributes: Vec<TimelineAttribute>,
    /// Item actions, in wire order.
    pub actions: Vec<TimelineAction>,
}

fn count_u8(field: &'static str, len: usize) -> Result<u8, EncodeError> {
    u8::try_from(len).map_err(|_| EncodeError::FieldTooLong {
        field,
        len,
        max: u8::MAX as usize,
    })
}

impl TimelineItem {
    /// First attribute with `id`, if any.
    pub fn attribute(&self, id: TimelineAttributeId) -> Option<&TimelineAttribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    /// Serialize to the BlobDB value format.
    ///
    /// # Errors
    ///
    /// Returns `FieldTooLong` if an attribute exceeds 65535 bytes, more than
    /// 255 attributes or actions are present, or the data section overflows
    /// its length field.
    pub fn encode(&self) -> Result<Bytes, ValidationError> {
        let mut data = ByteWriter::new();
        for attribute in &self.attributes {
            attribute.write_to(&mut data)?;
        }
        for action in &self.actions {
            data.write_u8(action.id);
            data.write_u8(action.action_type.0);
            data.write_u8(count_u8("action attributes", action.attributes.len())?);
            for attribute in &action.attributes {
                attribute.write_to(&mut data)?;
            }
        }

        let mut writer = ByteWriter::with_capacity(46 + data.len());
        writer.write_bytes(self.item_id.as_bytes());
        writer.write_bytes(self.parent_id.as_bytes());
        writer.write_u32(self.timestamp, Endian::Little);
        writer.write_u16(self.duration, Endian::Little);
        writer.write_u8(self.item_type as u8);
        writer.write_u16(self.flags, Endian::Little);
        writer.write_u8(self.layout as u8);
        let data_length = u16::try_from(data.len()).map_err(|_| EncodeError::FieldTooLong {
            field: "timeline data",
            len: data.len(),
            max: u16::MAX as usize,
        })?;
        writer.write_u16(data_length, Endian::Little);
        writer.write_u8(count_u8("attributes", self.attributes.len())?);
        writer.write_u8(count_u8("actions", self.actions.len())?);
        writer.write_bytes(data.as_slice());
        Ok(writer.into_bytes())
    }

    /// Parse a BlobDB value.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on truncated input, unknown enumerations,
    /// or when the data section is not exactly `data_length` bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(bytes);
        let item_id = Uuid::from_bytes(reader.read_array()?);
        let parent_id = Uuid::from_bytes(reader.read_array()?);
        let timestamp = reader.read_u32(Endian::Little)?;
        let duration = reader.read_u16(Endian::Little)?;
        let item_type = TimelineItemType::try_from(reader.read_u8()?)?;
        let flags = reader.read_u16(Endian::Little)?;
        let layout = TimelineLayout::try_from(reader.read_u8()?)?;
        let data_length = reader.read_u16(Endian::Little)? as usize;
        let attribute_count = reader.read_u8()?;
        let action_count = reader.read_u8()?;

        if reader.remaining() != data_length {
            return Err(DecodeError::LengthMismatch {
                field: "timeline data",
                declared: data_length,
                actual: reader.remaining(),
            });
        }

        let attributes = (0..attribute_count)
            .map(|_| TimelineAttribute::read_from(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;

        let mut actions = Vec::with_capacity(action_count as usize);
        for _ in 0..action_count {
            let id = reader.read_u8()?;
            let action_type = TimelineActionType(reader.read_u8()?);
            let count = reader.read_u8()?;
            let attributes = (0..count)
                .map(|_| TimelineAttribute::read_from(&mut reader))
                .collect::<Result<Vec<_>, _>>()?;
            actions.push(TimelineAction {
                id,
                action_type,
                attributes,
            });
        }
        reader.finish()?;

        Ok(Self {
            item_id,
            parent_id,
            timestamp,
            duration,
            item_type,
            flags,
            layout,
            attributes,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> TimelineItem {
        TimelineItem {
            item_id: Uuid::from_u128(0x0011_2233_4455_6677_8899_AABB_CCDD_EEFF),
            parent_id: Uuid::nil(),
            timestamp: 1_600_000_000,
            duration: 0,
            item_type: TimelineItemType::Notification,
            flags: 0,
            layout: TimelineLayout::GenericNotification,
            attributes: vec![TimelineAttribute::text(TimelineAttributeId::TITLE, "Hi")],
            actions: vec![TimelineAction::dismiss(0)],
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample_item().encode().expect("encode");

        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[15], 0xFF);
        assert!(bytes[16..32].iter().all(|b| *b == 0));
        assert_eq!(&bytes[32..36], &1_600_000_000u32.to_le_bytes());
        assert_eq!(bytes[38], 1); // notification
        assert_eq!(bytes[41], 0x04); // generic notification layout

        // Title "Hi" = 1 + 2 + 2; dismiss action = 3 + (1 + 2 + 7)
        let data_length = u16::from_le_bytes([bytes[42], bytes[43]]);
        assert_eq!(data_length, 5 + 13);
        assert_eq!(bytes[44], 1);
        assert_eq!(bytes[45], 1);
        assert_eq!(bytes.len(), 46 + 18);
    }

    #[test]
    fn test_decode_restores_item() {
        let item = sample_item();
        let bytes = item.encode().expect("encode");
        assert_eq!(TimelineItem::decode(&bytes), Ok(item));
    }

    #[test]
    fn test_decode_rejects_bad_data_length() {
        let mut bytes = sample_item().encode().expect("encode").to_vec();
        bytes.push(0);
        assert!(matches!(
            TimelineItem::decode(&bytes),
            Err(DecodeError::LengthMismatch { declared: 18, actual: 19, .. })
        ));
    }

    #[test]
    fn test_oversized_attribute_rejected() {
        let mut item = sample_item();
        let huge = "x".repeat(70_000);
        item.attributes
            .push(TimelineAttribute::text(TimelineAttributeId::BODY, &huge));
        assert!(matches!(
            item.encode(),
            Err(ValidationError::FieldTooLong(EncodeError::FieldTooLong {
                field: "timeline attribute",
                ..
            }))
        ));
    }

    #[test]
    fn test_attribute_accessors() {
        let icon = TimelineAttribute::uint32(TimelineAttributeId::TINY_ICON, 0x8000_0013);
        assert_eq!(icon.content.as_ref(), &[0x13, 0x00, 0x00, 0x80]);
        assert_eq!(icon.as_u32(), Some(0x8000_0013));

        let color = TimelineAttribute::uint8(TimelineAttributeId::BACKGROUND_COLOR, 0xF3);
        assert_eq!(color.as_u32(), None);
        assert_eq!(color.content.as_ref(), &[0xF3]);
    }
}
