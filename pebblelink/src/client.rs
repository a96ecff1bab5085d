//! PebbleClient: the wired-up protocol context.
//!
//! One client owns one packet registry and one set of services sharing a
//! single outbound sink. The matching [`InboundDispatcher`] is returned
//! alongside so the caller can drive it from the transport's read loop.

use std::sync::Arc;

use pebblelink_core::{RandomProvider, TimeProvider, TokioRandomProvider, TokioTimeProvider};
use tokio::sync::mpsc;

use crate::config::ProtocolConfig;
use crate::dispatcher::InboundDispatcher;
use crate::error::ProtocolError;
use crate::packet::{BlobStatus, PacketRegistry, PebblePacket, PushNotification};
use crate::services::{BlobDbService, NotificationService, PingService};
use crate::transport::PacketSink;

/// Parts returned by [`PebbleClient::new`].
pub type ClientParts<TP, R> = (
    PebbleClient<TP, R>,
    InboundDispatcher<TP, R>,
    mpsc::UnboundedReceiver<PebblePacket>,
);

/// Phone-side protocol client.
#[derive(Debug, Clone)]
pub struct PebbleClient<TP = TokioTimeProvider, R = TokioRandomProvider> {
    config: ProtocolConfig,
    registry: Arc<PacketRegistry>,
    blobdb: BlobDbService<TP, R>,
    notifications: NotificationService<TP, R>,
    ping: PingService<TP>,
}

impl PebbleClient {
    /// Build a client sending through `sink`, using tokio time and the
    /// thread-local RNG.
    ///
    /// Returns the client, the dispatcher for inbound frames, and the
    /// receiver of packets no request was waiting for.
    pub fn new<S>(
        config: ProtocolConfig,
        sink: S,
    ) -> ClientParts<TokioTimeProvider, TokioRandomProvider>
    where
        S: PacketSink + 'static,
    {
        Self::with_providers(
            config,
            sink,
            TokioTimeProvider::new(),
            TokioRandomProvider::new(),
        )
    }
}

impl<TP: TimeProvider, R: RandomProvider> PebbleClient<TP, R> {
    /// Build a client with explicit time and randomness providers.
    pub fn with_providers<S>(
        config: ProtocolConfig,
        sink: S,
        time: TP,
        random: R,
    ) -> ClientParts<TP, R>
    where
        S: PacketSink + 'static,
    {
        let sink: Arc<dyn PacketSink> = Arc::new(sink);
        let registry = Arc::new(PacketRegistry::setup());

        let blobdb = BlobDbService::new(
            Arc::clone(&sink),
            time.clone(),
            random.clone(),
            config.blobdb_timeout,
        );
        let notifications = NotificationService::new(blobdb.clone(), random);
        let ping = PingService::new(sink, time, config.ping_timeout);

        let (unsolicited_tx, unsolicited_rx) = mpsc::unbounded_channel();
        let dispatcher = InboundDispatcher::new(
            Arc::clone(&registry),
            blobdb.clone(),
            ping.clone(),
            unsolicited_tx,
        );
        tracing::debug!(endpoints = registry.len(), "pebble client ready");

        let client = Self {
            config,
            registry,
            blobdb,
            notifications,
            ping,
        };
        (client, dispatcher, unsolicited_rx)
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Packet registry shared with the dispatcher.
    pub fn registry(&self) -> &Arc<PacketRegistry> {
        &self.registry
    }

    /// BlobDB service.
    pub fn blobdb(&self) -> &BlobDbService<TP, R> {
        &self.blobdb
    }

    /// Notification service.
    pub fn notifications(&self) -> &NotificationService<TP, R> {
        &self.notifications
    }

    /// Ping service.
    pub fn ping_service(&self) -> &PingService<TP> {
        &self.ping
    }

    /// Show `notification` on the watch.
    ///
    /// # Errors
    ///
    /// See [`NotificationService::push`].
    pub async fn push_notification(
        &self,
        notification: &PushNotification,
    ) -> Result<BlobStatus, ProtocolError> {
        self.notifications.push(notification).await
    }

    /// Ping the watch and wait for the matching pong.
    ///
    /// # Errors
    ///
    /// See [`PingService::ping`].
    pub async fn ping(&self, cookie: u32) -> Result<u32, ProtocolError> {
        self.ping.ping(cookie).await
    }
}
