//! Request/response correlation.
//!
//! One outstanding request is one entry in a [`PendingRequests`] table:
//!
//! - **register**: insert the key, get a [`ReplyFuture`] for it
//! - **complete** / **cancel**: resolve the entry from the inbound path
//! - **await_result**: suspend the caller until resolved or timed out
//!
//! The table does not match responses to requests; callers supply the key
//! (a BlobDB token, a ping cookie).

mod pending;
mod reply_error;
mod reply_future;
mod reply_promise;

pub use pending::PendingRequests;
pub use reply_error::ReplyError;
pub use reply_future::ReplyFuture;
pub use reply_promise::ReplyPromise;
