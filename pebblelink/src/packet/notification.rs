//! Push notifications and their timeline encoding.

use pebblelink_core::EncodeError;
use uuid::Uuid;

use super::timeline::{
    TimelineAction, TimelineAttribute, TimelineAttributeId, TimelineItem, TimelineItemType,
    TimelineLayout,
};
use crate::error::ValidationError;

/// Marks an icon id as a system resource rather than an app resource.
const SYSTEM_RESOURCE_FLAG: u32 = 0x8000_0000;

/// Longest text a single attribute can carry.
const MAX_ATTRIBUTE_SIZE: usize = u16::MAX as usize;

/// Application a notification is attributed to. Selects the icon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NotificationSource {
    /// Generic bell icon.
    #[default]
    Generic,
    /// Twitter.
    Twitter,
    /// Facebook.
    Facebook,
    /// Email.
    Email,
    /// SMS.
    Sms,
}

impl NotificationSource {
    /// Firmware resource id of this source's icon.
    pub fn icon(self) -> u32 {
        match self {
            NotificationSource::Generic => 1,
            NotificationSource::Twitter => 6,
            NotificationSource::Facebook => 11,
            NotificationSource::Email => 19,
            NotificationSource::Sms => 45,
        }
    }
}

/// A notification to show on the watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushNotification {
    /// Who it is from; rendered as the title.
    pub sender: String,
    /// Optional subject line; omitted from the wire when empty.
    pub subject: String,
    /// Body text.
    pub message: String,
    /// 8-bit ARGB background color.
    pub background_color: u8,
    /// Originating application.
    pub source: NotificationSource,
}

impl PushNotification {
    /// Notification from `sender` with `message`, no subject, generic icon.
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            subject: String::new(),
            message: message.into(),
            background_color: 0,
            source: NotificationSource::Generic,
        }
    }

    /// Set the subject line.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the background color.
    pub fn with_background_color(mut self, color: u8) -> Self {
        self.background_color = color;
        self
    }

    /// Set the originating application.
    pub fn with_source(mut self, source: NotificationSource) -> Self {
        self.source = source;
        self
    }

    /// Check every text field fits its attribute.
    ///
    /// # Errors
    ///
    /// Returns `FieldTooLong` naming the first oversized field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, text) in [
            ("sender", &self.sender),
            ("subject", &self.subject),
            ("message", &self.message),
        ] {
            if text.len() > MAX_ATTRIBUTE_SIZE {
                return Err(EncodeError::FieldTooLong {
                    field,
                    len: text.len(),
                    max: MAX_ATTRIBUTE_SIZE,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Build the timeline item stored in the notification database.
    pub fn to_timeline_item(&self, item_id: Uuid, timestamp: u32) -> TimelineItem {
        let mut attributes = Vec::with_capacity(5);
        attributes.push(TimelineAttribute::text(
            TimelineAttributeId::TITLE,
            &self.sender,
        ));
        if !self.subject.is_empty() {
            attributes.push(TimelineAttribute::text(
                TimelineAttributeId::SUBTITLE,
                &self.subject,
            ));
        }
        attributes.push(TimelineAttribute::text(
            TimelineAttributeId::BODY,
            &self.message,
        ));
        attributes.push(TimelineAttribute::uint32(
            TimelineAttributeId::TINY_ICON,
            self.source.icon() | SYSTEM_RESOURCE_FLAG,
        ));
        attributes.push(TimelineAttribute::uint8(
            TimelineAttributeId::BACKGROUND_COLOR,
            self.background_color,
        ));

        TimelineItem {
            item_id,
            parent_id: Uuid::nil(),
            timestamp,
            duration: 0,
            item_type: TimelineItemType::Notification,
            flags: 0,
            layout: TimelineLayout::GenericNotification,
            attributes,
            actions: vec![TimelineAction::dismiss(0)],
        }
    }
}
