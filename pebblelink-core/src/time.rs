//! Time provider abstraction.
//!
//! Request deadlines and notification timestamps go through
//! [`TimeProvider`] rather than calling tokio or the system clock directly,
//! so the protocol layer can be driven by a paused clock in tests or by any
//! other timer implementation.

use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur during time operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The operation timed out.
    #[error("operation timed out")]
    Elapsed,
}

/// Provider trait for time operations.
///
/// `now()` is the elapsed time since the provider was created, which is all
/// the protocol layer needs to stamp pending requests. `unix_time()` is the
/// wall clock the watch displays timestamps in.
#[async_trait]
pub trait TimeProvider: Clone + Send + Sync + 'static {
    /// Elapsed time since provider creation.
    fn now(&self) -> Duration;

    /// Wall-clock time since the Unix epoch.
    fn unix_time(&self) -> Duration;

    /// Run a future with a timeout.
    ///
    /// Returns `Ok(result)` if the future completes within the timeout,
    /// or `Err(TimeError::Elapsed)` if it times out.
    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, TimeError>
    where
        F: std::future::Future<Output = T> + Send,
        T: Send;
}

/// Real time provider using Tokio's time facilities.
///
/// Honors `tokio::time::pause()`, so `#[tokio::test(start_paused = true)]`
/// gives deterministic deadlines. The wall clock is read once at creation
/// and then advances with the tokio clock.
#[derive(Debug, Clone)]
pub struct TokioTimeProvider {
    start_time: tokio::time::Instant,
    unix_epoch: Duration,
}

impl TokioTimeProvider {
    /// Create a new Tokio time provider.
    pub fn new() -> Self {
        let unix_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::with_unix_epoch(unix_epoch)
    }

    /// Create a provider whose wall clock starts at `unix_epoch`.
    pub fn with_unix_epoch(unix_epoch: Duration) -> Self {
        Self {
            start_time: tokio::time::Instant::now(),
            unix_epoch,
        }
    }
}

impl Default for TokioTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeProvider for TokioTimeProvider {
    fn now(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn unix_time(&self) -> Duration {
        self.unix_epoch + self.now()
    }

    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, TimeError>
    where
        F: std::future::Future<Output = T> + Send,
        T: Send,
    {
        tokio::time::timeout(duration, future)
            .await
            .map_err(|_| TimeError::Elapsed)
    }
}
