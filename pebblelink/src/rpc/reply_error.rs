//! Error types for correlated request-response operations.
//!
//! These errors end the life of an outstanding request:
//! - No response arrived in time ([`ReplyError::Timeout`])
//! - The request was withdrawn ([`ReplyError::Cancelled`])
//! - The correlation key was already in flight ([`ReplyError::DuplicateKey`])
//! - The delivery half vanished without resolving ([`ReplyError::Dropped`])

use serde::{Deserialize, Serialize};

/// Errors that can end an outstanding request.
///
/// Serializable so outcomes can be recorded alongside other test fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyError {
    /// The timeout elapsed before a matching response arrived.
    ///
    /// A response arriving afterwards is dropped.
    Timeout,

    /// The request was cancelled before a response arrived.
    Cancelled,

    /// A request with the same correlation key is already outstanding.
    DuplicateKey,

    /// The pending entry was discarded without a response.
    ///
    /// Indicates the correlation table was torn down underneath the waiter.
    Dropped,
}

impl std::fmt::Display for ReplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyError::Timeout => write!(f, "request timed out"),
            ReplyError::Cancelled => write!(f, "request cancelled"),
            ReplyError::DuplicateKey => write!(f, "correlation key already in flight"),
            ReplyError::Dropped => write!(f, "pending request dropped without reply"),
        }
    }
}

impl std::error::Error for ReplyError {}
