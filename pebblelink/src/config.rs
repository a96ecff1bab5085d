//! Configuration for the protocol services.

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Timeouts and queue sizes used by a [`PebbleClient`](crate::PebbleClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// How long a BlobDB command waits for its response.
    pub blobdb_timeout: Duration,

    /// How long a ping waits for its pong.
    pub ping_timeout: Duration,

    /// Capacity of the inbound frame channel from [`inbound_channel`](Self::inbound_channel).
    pub inbound_queue_capacity: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            blobdb_timeout: Duration::from_secs(5),
            ping_timeout: Duration::from_secs(2),
            inbound_queue_capacity: 256,
        }
    }
}

impl ProtocolConfig {
    /// Set the BlobDB response timeout.
    pub fn with_blobdb_timeout(mut self, timeout: Duration) -> Self {
        self.blobdb_timeout = timeout;
        self
    }

    /// Set the ping timeout.
    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    /// Set the inbound queue capacity.
    pub fn with_inbound_queue_capacity(mut self, capacity: usize) -> Self {
        self.inbound_queue_capacity = capacity;
        self
    }

    /// Short timeouts for a watch on the local network or an emulator.
    pub fn local_network() -> Self {
        Self {
            blobdb_timeout: Duration::from_secs(1),
            ping_timeout: Duration::from_millis(500),
            inbound_queue_capacity: 64,
        }
    }

    /// Bounded channel for feeding inbound frames to an
    /// [`InboundDispatcher`](crate::InboundDispatcher).
    pub fn inbound_channel(&self) -> (mpsc::Sender<Bytes>, mpsc::Receiver<Bytes>) {
        mpsc::channel(self.inbound_queue_capacity.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProtocolConfig::default();
        assert_eq!(config.blobdb_timeout, Duration::from_secs(5));
        assert_eq!(config.ping_timeout, Duration::from_secs(2));
        assert_eq!(config.inbound_queue_capacity, 256);
    }

    #[test]
    fn test_builders() {
        let config = ProtocolConfig::local_network()
            .with_blobdb_timeout(Duration::from_millis(250))
            .with_inbound_queue_capacity(8);
        assert_eq!(config.blobdb_timeout, Duration::from_millis(250));
        assert_eq!(config.ping_timeout, Duration::from_millis(500));
        assert_eq!(config.inbound_queue_capacity, 8);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ProtocolConfig =
            serde_json::from_str(r#"{"inbound_queue_capacity": 16}"#).expect("deserialize");
        assert_eq!(config.inbound_queue_capacity, 16);
        assert_eq!(config.blobdb_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_capacity_channel_still_usable() {
        let config = ProtocolConfig::default().with_inbound_queue_capacity(0);
        let (tx, _rx) = config.inbound_channel();
        assert!(tx.try_send(Bytes::from_static(b"x")).is_ok());
    }
}
