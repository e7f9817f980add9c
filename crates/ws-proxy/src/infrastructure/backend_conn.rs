//! TCP connection to the room engine.
//!
//! Each browser session gets its own TCP connection to the engine.  The
//! connection is split into a [`FrameReader`] and a [`FrameWriter`] so the
//! two relay directions can own one half each.
//!
//! # Streaming frames
//!
//! TCP is a *stream* protocol: a single `read()` may return part of a frame
//! or several frames at once.  The reader therefore never issues a bare
//! `read()`; it uses `read_exact` for the 2-byte length prefix and again for
//! the payload, which loops over partial reads until the frame is complete.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use proxy_core::{
    decode_length_prefix, encode_frame, FrameError, Handshake, HandshakeError, LENGTH_PREFIX_SIZE,
};

/// Errors raised by the engine-side transport.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The socket failed or the engine closed it mid-frame.
    #[error("engine I/O error: {0}")]
    Io(#[from] io::Error),

    /// A frame could not be encoded or does not fit the caller's buffer.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The handshake could not be prepared.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
}

impl BackendError {
    /// Returns `true` when the engine simply closed the connection.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// An open TCP connection to the engine.
pub struct BackendConnection {
    stream: TcpStream,
}

impl BackendConnection {
    /// Opens a TCP connection to `host:port`.
    ///
    /// `TCP_NODELAY` is enabled so every frame leaves as soon as it is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be resolved or the connection is
    /// refused.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    /// Splits the connection into independently owned frame halves.
    pub fn into_split(self) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
        let (read_half, write_half) = self.stream.into_split();
        (FrameReader::new(read_half), FrameWriter::new(write_half))
    }
}

// ── Frame reader ──────────────────────────────────────────────────────────────

/// Reads length-prefixed frames from a byte stream.
pub struct FrameReader<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads one complete frame and returns its payload.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Io`] if the stream fails or ends before the
    /// frame is complete (`UnexpectedEof`).
    pub async fn read_frame(&mut self) -> Result<Vec<u8>, BackendError> {
        let len = self.read_length().await?;
        let mut payload = vec![0u8; len];
        self.inner.read_exact(&mut payload).await?;
        Ok(payload)
    }

    /// Reads one complete frame into `buf` and returns the payload length.
    ///
    /// For callers that reuse a fixed receive buffer.  The relay uses
    /// [`read_frame`](Self::read_frame), which sizes each payload exactly.
    /// A buffer of [`proxy_core::MAX_FRAME_LEN`] bytes fits every frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::BufferTooSmall`] if the declared length exceeds
    /// `buf.len()`.  The oversized payload is still consumed, so the next
    /// call starts at a frame boundary.
    pub async fn read_frame_into(&mut self, buf: &mut [u8]) -> Result<usize, BackendError> {
        let len = self.read_length().await?;
        if len > buf.len() {
            let skipped =
                tokio::io::copy(&mut (&mut self.inner).take(len as u64), &mut tokio::io::sink())
                    .await?;
            if skipped < len as u64 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            return Err(FrameError::BufferTooSmall {
                declared: len,
                capacity: buf.len(),
            }
            .into());
        }
        self.inner.read_exact(&mut buf[..len]).await?;
        Ok(len)
    }

    async fn read_length(&mut self) -> Result<usize, BackendError> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        self.inner.read_exact(&mut prefix).await?;
        Ok(decode_length_prefix(&prefix)?)
    }
}

// ── Frame writer ──────────────────────────────────────────────────────────────

/// Writes length-prefixed frames to a byte stream.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes `payload` as one frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] (wrapped) before writing anything if
    /// `payload` exceeds 65535 bytes, or [`BackendError::Io`] if the write
    /// fails.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), BackendError> {
        let frame = encode_frame(payload)?;
        self.write_encoded(&frame).await
    }

    /// Shuts down the write direction, signalling EOF to the engine.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }

    async fn write_encoded(&mut self, frame: &[u8]) -> Result<(), BackendError> {
        // Prefix and payload go out in one `write_all`.
        self.inner.write_all(frame).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

/// Writes the room handshake and returns the number of frames sent.
///
/// All frames are prepared before the first write, so an invalid token or an
/// oversized field sends nothing at all.
///
/// # Errors
///
/// Returns [`BackendError::Handshake`] for bad input, or
/// [`BackendError::Io`] if a write fails part-way.
pub async fn send_handshake<W: AsyncWrite + Unpin>(
    writer: &mut FrameWriter<W>,
    handshake: &Handshake<'_>,
) -> Result<usize, BackendError> {
    let frames = handshake.encode_frames()?;
    for frame in &frames {
        writer.write_encoded(frame).await?;
    }
    debug!(
        room_id = handshake.room_id,
        frames = frames.len(),
        "handshake written"
    );
    Ok(frames.len())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
