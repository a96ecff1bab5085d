//! Notification delivery over BlobDB.

use pebblelink_core::{RandomProvider, TimeProvider, TokioRandomProvider, TokioTimeProvider};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::BlobDbService;
use super::completion::Completion;
use crate::error::{ProtocolError, ValidationError};
use crate::packet::{BlobCommand, BlobDatabase, BlobStatus, PushNotification};

/// Shapes notifications into BlobDB inserts on the notification database.
#[derive(Debug, Clone)]
pub struct NotificationService<TP = TokioTimeProvider, R = TokioRandomProvider> {
    blobdb: BlobDbService<TP, R>,
    random: R,
}

impl<TP: TimeProvider, R: RandomProvider> NotificationService<TP, R> {
    /// Deliver notifications through `blobdb`, drawing item ids from `random`.
    pub fn new(blobdb: BlobDbService<TP, R>, random: R) -> Self {
        Self { blobdb, random }
    }

    /// Build the insert command for `notification` stored under `item_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a field exceeds the wire limits.
    pub fn build_command(
        notification: &PushNotification,
        item_id: Uuid,
        timestamp: u32,
    ) -> Result<BlobCommand, ValidationError> {
        notification.validate()?;
        let value = notification.to_timeline_item(item_id, timestamp).encode()?;
        let command = BlobCommand::insert(
            BlobDatabase::Notification,
            item_id.as_bytes().to_vec(),
            value,
        );
        command.validate()?;
        Ok(command)
    }

    fn next_item_id(&self) -> Uuid {
        uuid::Builder::from_random_bytes(self.random.random()).into_uuid()
    }

    /// Seconds since the Unix epoch on the service's time provider.
    fn timestamp(&self) -> u32 {
        let secs = self.blobdb.time().unix_time().as_secs();
        u32::try_from(secs).unwrap_or(u32::MAX)
    }

    /// Show `notification` on the watch and wait for the insert's status.
    ///
    /// # Errors
    ///
    /// See [`BlobDbService::request`].
    pub async fn push(&self, notification: &PushNotification) -> Result<BlobStatus, ProtocolError> {
        let item_id = self.next_item_id();
        let command = Self::build_command(notification, item_id, self.timestamp())?;
        tracing::debug!(%item_id, source = ?notification.source, "pushing notification");
        self.blobdb.request(command).await
    }

    /// Show `notification` in the background; `on_complete` runs exactly once.
    pub fn send<F>(&self, notification: &PushNotification, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<BlobStatus, ProtocolError>) + Send + 'static,
    {
        let item_id = self.next_item_id();
        match Self::build_command(notification, item_id, self.timestamp()) {
            Ok(command) => self.blobdb.send(command, on_complete),
            Err(err) => {
                let completion = Completion::new(on_complete);
                tokio::spawn(async move { completion.complete(Err(err.into())) })
            }
        }
    }

    /// Remove a previously pushed notification.
    ///
    /// # Errors
    ///
    /// See [`BlobDbService::request`].
    pub async fn remove(&self, item_id: Uuid) -> Result<BlobStatus, ProtocolError> {
        self.blobdb
            .delete(BlobDatabase::Notification, item_id.as_bytes().to_vec())
            .await
    }
}
