//! Bounded cursors over the shared upcall buffer.
//!
//! The driver hands the daemon a fixed-size region for every upcall. Requests
//! are decoded with [`UpcallReader`] and replies are encoded into the same kind
//! of region with [`ReplyWriter`]. Both types are the only path through which
//! the daemon touches upcall memory: every read and write checks the remaining
//! length first and fails with a [`CodecError`] instead of running past the end.
//!
//! # Invariants
//!
//! - The remaining length only ever shrinks and never wraps below zero.
//! - A failed read or write leaves the cursor exactly where it was.
//! - Integers use native byte order because the buffer never leaves the host.

use crate::error::CodecError;

/// Read cursor over a request buffer filled by the driver.
#[derive(Clone, Debug)]
pub struct UpcallReader<'a> {
    buf: &'a [u8],
}

impl<'a> UpcallReader<'a> {
    /// Creates a reader over `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` once every byte has been consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the unread tail without consuming it.
    #[must_use]
    pub const fn as_slice(&self) -> &'a [u8] {
        self.buf
    }

    /// Consumes `len` bytes and returns them as a borrowed slice.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.buf.len() < len {
            return Err(CodecError::Underflow {
                needed: len,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Consumes exactly `N` bytes into a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads a native-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        self.read_array().map(u32::from_ne_bytes)
    }

    /// Reads a native-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        self.read_array().map(u64::from_ne_bytes)
    }
}

/// Write cursor over a reply buffer that the driver will consume.
///
/// The writer never grows its buffer. Capacity is checked before any byte is
/// copied, so a rejected write leaves the buffer contents untouched.
#[derive(Debug)]
pub struct ReplyWriter<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> ReplyWriter<'a> {
    /// Creates a writer positioned at the start of `buf`.
    #[must_use]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, written: 0 }
    }

    /// Total capacity of the underlying buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Capacity still available for writes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.written
    }

    /// Number of bytes written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Fails with [`CodecError::Overflow`] unless `len` more bytes fit.
    pub fn ensure(&self, len: usize) -> Result<(), CodecError> {
        let remaining = self.remaining();
        if remaining < len {
            return Err(CodecError::Overflow {
                needed: len,
                remaining,
            });
        }
        Ok(())
    }

    /// Appends `src` to the reply.
    pub fn write_bytes(&mut self, src: &[u8]) -> Result<(), CodecError> {
        self.ensure(src.len())?;
        let end = self.written + src.len();
        self.buf[self.written..end].copy_from_slice(src);
        self.written = end;
        Ok(())
    }

    /// Appends a native-endian `u32`.
    pub fn write_u32(&mut self, value: u32) -> Result<(), CodecError> {
        self.write_bytes(&value.to_ne_bytes())
    }

    /// Appends a native-endian `u64`.
    pub fn write_u64(&mut self, value: u64) -> Result<(), CodecError> {
        self.write_bytes(&value.to_ne_bytes())
    }

    /// Consumes the writer and returns the number of bytes written.
    #[must_use]
    pub const fn into_written(self) -> usize {
        self.written
    }
}
