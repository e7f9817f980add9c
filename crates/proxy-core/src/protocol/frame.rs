//! Length-prefixed frame codec for the engine TCP protocol.
//!
//! Wire format:
//! ```text
//! [payload_len:2][payload:N]
//! ```
//! The length is an unsigned 16-bit little-endian integer, so a single frame
//! can carry at most 65535 payload bytes.  That ceiling is part of the wire
//! format and cannot be raised without breaking the engine.

use thiserror::Error;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Largest payload a single frame can carry.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The payload does not fit in the 16-bit length prefix.
    #[error("frame payload of {len} bytes exceeds the {} byte limit", MAX_FRAME_LEN)]
    TooLarge { len: usize },

    /// The byte slice does not yet contain a complete frame.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The declared payload length is larger than the buffer supplied by the
    /// caller.
    #[error("frame of {declared} bytes does not fit in a {capacity} byte buffer")]
    BufferTooSmall { declared: usize, capacity: usize },
}

/// Encodes `payload` into a complete frame (length prefix + payload).
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] if `payload` is longer than
/// [`MAX_FRAME_LEN`].  No bytes are produced in that case.
///
/// # Examples
///
/// ```rust
/// use proxy_core::encode_frame;
///
/// let frame = encode_frame(b"hello").unwrap();
/// assert_eq!(frame, [5, 0, b'h', b'e', b'l', b'l', b'o']);
/// ```
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = u16::try_from(payload.len()).map_err(|_| FrameError::TooLarge {
        len: payload.len(),
    })?;

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Reads the declared payload length from the start of `bytes`.
///
/// # Errors
///
/// Returns [`FrameError::InsufficientData`] if fewer than
/// [`LENGTH_PREFIX_SIZE`] bytes are available.
pub fn decode_length_prefix(bytes: &[u8]) -> Result<usize, FrameError> {
    match bytes {
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi]) as usize),
        _ => Err(FrameError::InsufficientData {
            needed: LENGTH_PREFIX_SIZE,
            available: bytes.len(),
        }),
    }
}

/// Decodes one frame from the beginning of `bytes`.
///
/// Returns the payload and the total number of bytes consumed (prefix +
/// payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`FrameError::InsufficientData`] if `bytes` holds only part of a
/// frame.  This is the normal "wait for more input" signal for buffered
/// readers.
///
/// # Examples
///
/// ```rust
/// use proxy_core::{decode_frame, encode_frame};
///
/// let bytes = encode_frame(b"world").unwrap();
/// let (payload, consumed) = decode_frame(&bytes).unwrap();
/// assert_eq!(payload, b"world");
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn decode_frame(bytes: &[u8]) -> Result<(Vec<u8>, usize), FrameError> {
    let len = decode_length_prefix(bytes)?;
    let total = LENGTH_PREFIX_SIZE + len;
    if bytes.len() < total {
        return Err(FrameError::InsufficientData {
            needed: total,
            available: bytes.len(),
        });
    }
    Ok((bytes[LENGTH_PREFIX_SIZE..total].to_vec(), total))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
