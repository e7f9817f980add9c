//! # proxy-core
//!
//! Wire-level building blocks for talking to the room engine behind the
//! WebSocket proxy.
//!
//! The engine speaks a very small binary protocol over raw TCP: every message
//! is a 2-byte little-endian length followed by that many payload bytes.  A
//! freshly opened connection must first be authorised for a room by sending a
//! fixed sequence of such frames (the handshake).  After that, frames carry
//! opaque application payloads in both directions.
//!
//! This crate contains only pure functions and value types:
//!
//! - **`protocol::frame`** – encoding and decoding of length-prefixed frames.
//! - **`protocol::handshake`** – the ordered list of frames that authorises a
//!   room session.
//!
//! It has no dependency on sockets or an async runtime, so the proxy (and its
//! tests) can drive it over any transport.

pub mod protocol;

pub use protocol::frame::{
    decode_frame, decode_length_prefix, encode_frame, FrameError, LENGTH_PREFIX_SIZE,
    MAX_FRAME_LEN,
};
pub use protocol::handshake::{Handshake, HandshakeError};
