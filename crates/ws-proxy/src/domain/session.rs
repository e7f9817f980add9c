//! Session lifecycle phases.

use std::fmt;

/// Where in its lifecycle a session was when something happened.
///
/// Attached as context to every session error, so a log line always says
/// which step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for and parsing the browser's session descriptor.
    Descriptor,
    /// Opening the TCP connection to the engine.
    Dial,
    /// Writing the room handshake to the engine.
    Handshake,
    /// Relaying frames in both directions.
    Relay,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Descriptor => "descriptor",
            Self::Dial => "dial",
            Self::Handshake => "handshake",
            Self::Relay => "relay",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} phase", self.as_str())
    }
}
