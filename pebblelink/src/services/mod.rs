//! Request-shaping services on top of the correlation table.
//!
//! - [`BlobDbService`]: tokens, sends, resolves BlobDB commands
//! - [`NotificationService`]: turns notifications into BlobDB inserts
//! - [`PingService`]: cookie-correlated liveness checks

mod blobdb;
mod completion;
mod notification;
mod ping;

pub use blobdb::BlobDbService;
pub use notification::NotificationService;
pub use ping::PingService;
