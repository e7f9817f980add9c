//! Protocol module containing the frame codec and the room handshake.

pub mod frame;
pub mod handshake;

pub use frame::{decode_frame, encode_frame, FrameError, LENGTH_PREFIX_SIZE, MAX_FRAME_LEN};
pub use handshake::{Handshake, HandshakeError};
