//! Byte codec for Pebble protocol fields.
//!
//! [`ByteWriter`] appends fixed-width integers and length-prefixed blobs to a
//! growable buffer. [`ByteReader`] walks a borrowed slice with a cursor and
//! refuses to read past the end: every read checks the remaining length first
//! and reports [`DecodeError::Truncated`] instead of panicking.
//!
//! The Pebble protocol mixes byte orders (the frame header is big-endian,
//! BlobDB fields are little-endian), so every multi-byte operation takes an
//! explicit [`Endian`].
//!
//! # Example
//!
//! ```rust
//! use pebblelink_core::{ByteReader, ByteWriter, Endian};
//!
//! let mut writer = ByteWriter::new();
//! writer.write_u16(0xB1DB, Endian::Big);
//! writer.write_prefixed_u8("key", b"abc").expect("fits");
//!
//! let bytes = writer.into_bytes();
//! let mut reader = ByteReader::new(&bytes);
//! assert_eq!(reader.read_u16(Endian::Big).expect("u16"), 0xB1DB);
//! assert_eq!(reader.read_prefixed_u8().expect("key"), b"abc");
//! reader.finish().expect("fully consumed");
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Most significant byte first (network order).
    Big,
    /// Least significant byte first (the watch's native word order).
    Little,
}

/// Errors raised while decoding bytes into typed fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer bytes remain than the field needs.
    #[error("truncated input at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        /// Cursor position where the read was attempted.
        offset: usize,
        /// Bytes the field needs.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// Bytes remain after the last field of a payload.
    #[error("{count} trailing bytes after payload")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },

    /// No decoder is registered for the endpoint.
    #[error("unknown endpoint {endpoint:#06x}")]
    UnknownEndpoint {
        /// The endpoint id read from the frame header.
        endpoint: u16,
    },

    /// A field holds a value outside its enumeration.
    #[error("invalid {field}: {value:#x}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// The raw value found on the wire.
        value: u32,
    },

    /// A declared length disagrees with the bytes actually present.
    #[error("{field} declares {declared} bytes but {actual} are present")]
    LengthMismatch {
        /// Name of the length-carrying field.
        field: &'static str,
        /// Length stated on the wire.
        declared: usize,
        /// Length actually available.
        actual: usize,
    },
}

/// Errors raised while encoding a field that cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// A length-prefixed field does not fit its prefix width.
    #[error("{field} is {len} bytes, max {max}")]
    FieldTooLong {
        /// Name of the field.
        field: &'static str,
        /// Actual length in bytes.
        len: usize,
        /// Largest length the prefix can express.
        max: usize,
    },
}

/// Append-only writer over a growable buffer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: BytesMut,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Append a 16-bit integer.
    pub fn write_u16(&mut self, value: u16, endian: Endian) {
        match endian {
            Endian::Big => self.buf.put_u16(value),
            Endian::Little => self.buf.put_u16_le(value),
        }
    }

    /// Append a 32-bit integer.
    pub fn write_u32(&mut self, value: u32, endian: Endian) {
        match endian {
            Endian::Big => self.buf.put_u32(value),
            Endian::Little => self.buf.put_u32_le(value),
        }
    }

    /// Append raw bytes with no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Append `bytes` preceded by a one-byte length.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::FieldTooLong`] if `bytes` exceeds 255 bytes.
    /// Nothing is written in that case.
    pub fn write_prefixed_u8(
        &mut self,
        field: &'static str,
        bytes: &[u8],
    ) -> Result<(), EncodeError> {
        let len = u8::try_from(bytes.len()).map_err(|_| EncodeError::FieldTooLong {
            field,
            len: bytes.len(),
            max: u8::MAX as usize,
        })?;
        self.write_u8(len);
        self.write_bytes(bytes);
        Ok(())
    }

    /// Append `bytes` preceded by a two-byte length.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::FieldTooLong`] if `bytes` exceeds 65535 bytes.
    /// Nothing is written in that case.
    pub fn write_prefixed_u16(
        &mut self,
        field: &'static str,
        bytes: &[u8],
        endian: Endian,
    ) -> Result<(), EncodeError> {
        let len = u16::try_from(bytes.len()).map_err(|_| EncodeError::FieldTooLong {
            field,
            len: bytes.len(),
            max: u16::MAX as usize,
        })?;
        self.write_u16(len, endian);
        self.write_bytes(bytes);
        Ok(())
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Freeze the buffer into immutable bytes.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Bounds-checked cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    remaining: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at the beginning of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            remaining: buf,
            position: 0,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Whether the cursor reached the end.
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining.len() < needed {
            return Err(DecodeError::Truncated {
                offset: self.position,
                needed,
                available: self.remaining.len(),
            });
        }
        Ok(())
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        self.position += 1;
        Ok(self.remaining.get_u8())
    }

    /// Read a 16-bit integer.
    pub fn read_u16(&mut self, endian: Endian) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        self.position += 2;
        Ok(match endian {
            Endian::Big => self.remaining.get_u16(),
            Endian::Little => self.remaining.get_u16_le(),
        })
    }

    /// Read a 32-bit integer.
    pub fn read_u32(&mut self, endian: Endian) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        self.position += 4;
        Ok(match endian {
            Endian::Big => self.remaining.get_u32(),
            Endian::Little => self.remaining.get_u32_le(),
        })
    }

    /// Read exactly `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(len)?;
        let (head, tail) = self.remaining.split_at(len);
        self.remaining = tail;
        self.position += len;
        Ok(head)
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a blob preceded by a one-byte length.
    pub fn read_prefixed_u8(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_u8()? as usize;
        self.read_bytes(len)
    }

    /// Read a blob preceded by a two-byte length.
    pub fn read_prefixed_u16(&mut self, endian: Endian) -> Result<&'a [u8], DecodeError> {
        let len = self.read_u16(endian)? as usize;
        self.read_bytes(len)
    }

    /// Assert that the payload was fully consumed.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TrailingBytes`] if unread bytes remain.
    pub fn finish(self) -> Result<(), DecodeError> {
        if self.remaining.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TrailingBytes {
                count: self.remaining.len(),
            })
        }
    }
}
