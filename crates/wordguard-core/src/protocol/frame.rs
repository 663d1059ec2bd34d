// ============================================
// File: crates/wordguard-core/src/protocol/frame.rs
// ============================================
//! # Stream Framing
//!
//! ## Creation Reason
//! TCP delivers a byte stream, not records. Every encoded envelope is
//! sent behind a length prefix so the receiver can re-delimit envelopes
//! no matter how the bytes were split or merged by the network.
//!
//! ## Wire Format
//! ```text
//! +----------------+--------------------------+
//! | LENGTH (2B BE) | ENVELOPE JSON (N bytes)  |
//! +----------------+--------------------------+
//! ```
//!
//! ## Main Functionality
//! - `encode_frame`: prefix a body for sending
//! - `FrameDecoder`: accumulate socket reads, yield complete bodies
//!
//! ## ⚠️ Important Note for Next Developer
//! - A zero or oversized length is fatal: once a prefix is wrong the
//!   stream cannot be resynchronised
//! - `MAX_FRAME_LENGTH` must stay below `u16::MAX`
//!
//! ## Last Modified
//! v0.1.0 - Length-prefixed framing

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Length prefix size.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Maximum body length of one frame.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024;

/// Size of a single socket read.
pub const READ_CHUNK_SIZE: usize = 4096;

// ============================================
// Encoding
// ============================================

/// Prefixes `body` with its big-endian length.
///
/// # Errors
/// `EmptyFrame` or `FrameTooLarge` if the body cannot be framed.
pub fn encode_frame(body: &[u8]) -> Result<Bytes> {
    let len = check_length(body.len())?;
    let mut wire = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + body.len());
    wire.put_u16(len);
    wire.put_slice(body);
    Ok(wire.freeze())
}

/// Reads a length prefix and validates it.
///
/// # Errors
/// `EmptyFrame` or `FrameTooLarge`.
pub fn read_length(prefix: [u8; LENGTH_PREFIX_SIZE]) -> Result<usize> {
    let len = usize::from(u16::from_be_bytes(prefix));
    check_length(len)?;
    Ok(len)
}

fn check_length(len: usize) -> Result<u16> {
    if len == 0 {
        return Err(CoreError::EmptyFrame);
    }
    if len > MAX_FRAME_LENGTH {
        return Err(CoreError::FrameTooLarge {
            max: MAX_FRAME_LENGTH,
            actual: len,
        });
    }
    // MAX_FRAME_LENGTH < u16::MAX
    u16::try_from(len).map_err(|_| CoreError::FrameTooLarge {
        max: MAX_FRAME_LENGTH,
        actual: len,
    })
}

// ============================================
// FrameDecoder
// ============================================

/// Incremental frame decoder.
///
/// # Example
/// ```
/// use wordguard_core::protocol::frame::{encode_frame, FrameDecoder};
///
/// let wire = encode_frame(b"{}").unwrap();
/// let mut decoder = FrameDecoder::new();
/// decoder.extend(&wire[..1]);
/// assert!(decoder.next_frame().unwrap().is_none());
/// decoder.extend(&wire[1..]);
/// assert_eq!(&decoder.next_frame().unwrap().unwrap()[..], b"{}");
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Appends freshly read bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet returned as frames.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pops the next complete frame body, if one is buffered.
    ///
    /// # Errors
    /// `EmptyFrame` or `FrameTooLarge` on a bad prefix. The decoder is
    /// unusable afterwards.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        if self.buf.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }
        let len = read_length([self.buf[0], self.buf[1]])?;
        if self.buf.len() < LENGTH_PREFIX_SIZE + len {
            return Ok(None);
        }
        self.buf.advance(LENGTH_PREFIX_SIZE);
        Ok(Some(self.buf.split_to(len).freeze()))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_prefix() {
        let wire = encode_frame(b"abc").unwrap();
        assert_eq!(&wire[..], &[0x00, 0x03, b'a', b'b', b'c']);
    }

    #[test]
    fn test_encode_rejects_bad_sizes() {
        assert!(matches!(encode_frame(b""), Err(CoreError::EmptyFrame)));
        let big = vec![0u8; MAX_FRAME_LENGTH + 1];
        assert!(matches!(
            encode_frame(&big),
            Err(CoreError::FrameTooLarge { actual, .. }) if actual == MAX_FRAME_LENGTH + 1
        ));
        assert!(encode_frame(&vec![1u8; MAX_FRAME_LENGTH]).is_ok());
    }

    #[test]
    fn test_coalesced_frames() {
        let mut wire = BytesMut::new();
        wire.extend_from_slice(&encode_frame(b"one").unwrap());
        wire.extend_from_slice(&encode_frame(b"two").unwrap());

        let mut decoder = FrameDecoder::new();
        decoder.extend(&wire);
        assert_eq!(&decoder.next_frame().unwrap().unwrap()[..], b"one");
        assert_eq!(&decoder.next_frame().unwrap().unwrap()[..], b"two");
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_split_frame_byte_by_byte() {
        let wire = encode_frame(b"hello world").unwrap();
        let mut decoder = FrameDecoder::new();
        for (i, byte) in wire.iter().enumerate() {
            decoder.extend(&[*byte]);
            let frame = decoder.next_frame().unwrap();
            if i + 1 < wire.len() {
                assert!(frame.is_none());
            } else {
                assert_eq!(&frame.unwrap()[..], b"hello world");
            }
        }
    }

    #[test]
    fn test_bad_prefix_is_fatal() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0xFF, 0xFF, 0x00]);
        let err = decoder.next_frame().unwrap_err();
        assert!(err.is_fatal());

        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0x00, 0x00]);
        assert!(matches!(decoder.next_frame(), Err(CoreError::EmptyFrame)));
    }
}
