//! Room handshake sent to the engine before any relayed traffic.
//!
//! The handshake is one-directional: the proxy writes a fixed sequence of
//! frames and the engine either keeps the connection open or closes it.
//! There is no acknowledgement to read back.
//!
//! ```text
//! frame 1: room_id            (4 bytes, i32 little-endian)
//! frame 2: application name   (UTF-8)
//! frame 3: version            (UTF-8)
//! frame 4: password           (UTF-8, empty frame when absent)
//! frame 5: token              (base64-decoded bytes, omitted when absent)
//! ```

use base64::engine::general_purpose::STANDARD as Base64Standard;
use base64::Engine;
use thiserror::Error;
use tracing::trace;

use crate::protocol::frame::{encode_frame, FrameError};

/// Errors that can occur while preparing the handshake.
#[derive(Debug, Error, PartialEq)]
pub enum HandshakeError {
    /// The token is not valid standard base64.
    #[error("invalid handshake token: {0}")]
    InvalidToken(#[from] base64::DecodeError),

    /// One of the handshake fields does not fit in a frame.
    #[error("handshake field does not fit in a frame: {0}")]
    Frame(#[from] FrameError),
}

/// The credentials that authorise a room session with the engine.
///
/// Borrowed from whatever structure the caller parsed them from; building a
/// `Handshake` never copies the strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake<'a> {
    pub room_id: i32,
    pub application_name: &'a str,
    pub version: &'a str,
    pub password: Option<&'a str>,
    /// Base64 encoded.  An empty string is treated the same as `None`.
    pub token: Option<&'a str>,
}

impl Handshake<'_> {
    /// Returns the handshake as encoded frames, in the order they must be
    /// written.
    ///
    /// Every fallible step (token decoding, size checks) runs before this
    /// returns, so a caller that writes the result never sends a partial
    /// handshake because of bad input.
    ///
    /// # Errors
    ///
    /// - [`HandshakeError::InvalidToken`] if the token is not valid base64.
    /// - [`HandshakeError::Frame`] if a field is longer than 65535 bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use proxy_core::Handshake;
    ///
    /// let hs = Handshake {
    ///     room_id: 7,
    ///     application_name: "demo",
    ///     version: "1.0",
    ///     password: None,
    ///     token: None,
    /// };
    /// let frames = hs.encode_frames().unwrap();
    /// assert_eq!(frames.len(), 4);
    /// assert_eq!(frames[0], [4, 0, 7, 0, 0, 0]);
    /// ```
    pub fn encode_frames(&self) -> Result<Vec<Vec<u8>>, HandshakeError> {
        let token = self.decoded_token()?;

        let mut frames = Vec::with_capacity(5);
        frames.push(encode_frame(&self.room_id.to_le_bytes())?);
        frames.push(encode_frame(self.application_name.as_bytes())?);
        frames.push(encode_frame(self.version.as_bytes())?);
        frames.push(encode_frame(self.password.unwrap_or_default().as_bytes())?);
        if let Some(token) = token {
            frames.push(encode_frame(&token)?);
        }

        trace!(
            room_id = self.room_id,
            frames = frames.len(),
            "prepared handshake"
        );
        Ok(frames)
    }

    fn decoded_token(&self) -> Result<Option<Vec<u8>>, HandshakeError> {
        match self.token {
            Some(token) if !token.is_empty() => Ok(Some(Base64Standard.decode(token)?)),
            _ => Ok(None),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> Handshake<'static> {
        Handshake {
            room_id: 7,
            application_name: "demo",
            version: "1.0",
            password: None,
            token: None,
        }
    }

    #[test]
    fn test_without_token_produces_four_frames_in_order() {
        // Act
        let frames = demo().encode_frames().unwrap();

        // Assert
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], vec![4, 0, 7, 0, 0, 0]);
        assert_eq!(frames[1], vec![4, 0, b'd', b'e', b'm', b'o']);
        assert_eq!(frames[2], vec![3, 0, b'1', b'.', b'0']);
        assert_eq!(frames[3], vec![0, 0], "absent password is an empty frame");
    }

    #[test]
    fn test_with_token_appends_decoded_bytes() {
        // Arrange: "AQID" is base64 for [1, 2, 3]
        let hs = Handshake {
            token: Some("AQID"),
            ..demo()
        };

        // Act
        let frames = hs.encode_frames().unwrap();

        // Assert
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[4], vec![3, 0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_token_is_treated_as_absent() {
        let hs = Handshake {
            token: Some(""),
            ..demo()
        };
        assert_eq!(hs.encode_frames().unwrap().len(), 4);
    }

    #[test]
    fn test_password_is_sent_verbatim() {
        let hs = Handshake {
            password: Some("s3cret"),
            ..demo()
        };
        let frames = hs.encode_frames().unwrap();
        assert_eq!(&frames[3][2..], b"s3cret");
    }

    #[test]
    fn test_negative_room_id_is_twos_complement_little_endian() {
        let hs = Handshake {
            room_id: -2,
            ..demo()
        };
        let frames = hs.encode_frames().unwrap();
        assert_eq!(frames[0], vec![4, 0, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_invalid_token_fails_before_producing_frames() {
        let hs = Handshake {
            token: Some("not base64!"),
            ..demo()
        };
        assert!(matches!(
            hs.encode_frames(),
            Err(HandshakeError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_oversized_application_name_is_rejected() {
        let name = "x".repeat(70_000);
        let hs = Handshake {
            application_name: &name,
            ..demo()
        };
        assert_eq!(
            hs.encode_frames(),
            Err(HandshakeError::Frame(FrameError::TooLarge { len: 70_000 }))
        );
    }
}
