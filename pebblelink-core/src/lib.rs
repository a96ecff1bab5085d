//! # pebblelink-core
//!
//! Building blocks shared by the pebblelink protocol stack:
//!
//! - **Byte codec**: [`ByteWriter`] and [`ByteReader`] for fixed-width
//!   integers and length-prefixed blobs with explicit byte order
//! - **Provider traits**: [`TimeProvider`] for request deadlines and
//!   [`RandomProvider`] for correlation tokens, each with a Tokio-backed
//!   production implementation

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod codec;
mod random;
mod time;

// Codec exports
pub use codec::{ByteReader, ByteWriter, DecodeError, EncodeError, Endian};

// Provider trait exports
pub use random::{RandomProvider, SeededRandomProvider, TokioRandomProvider};
pub use time::{TimeError, TimeProvider, TokioTimeProvider};
