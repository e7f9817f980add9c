//! The session descriptor: the first message a browser sends.
//!
//! It names the room to join, the engine server hosting it and the
//! credentials to present.  The proxy parses it once, uses it to dial and
//! authorise the backend connection, and then discards it.
//!
//! ```json
//! {
//!   "room_id": 7,
//!   "server": {"host": "127.0.0.1", "port": 9000},
//!   "application_name": "demo",
//!   "version": "1.0",
//!   "password": "optional",
//!   "token": "optional, base64",
//!   "information": {"optional": "metadata"}
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while interpreting a session descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The message is not a JSON descriptor.
    #[error("malformed session descriptor: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The engine port is outside the TCP port range.
    #[error("engine port {0} is out of range")]
    InvalidPort(i32),
}

/// Engine server that hosts the room.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendServer {
    pub host: String,
    pub port: i32,
}

impl BackendServer {
    /// Returns the `(host, port)` pair to dial.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidPort`] if `port` is not in 1–65535.
    pub fn dial_target(&self) -> Result<(&str, u16), DescriptorError> {
        match u16::try_from(self.port) {
            Ok(port) if port != 0 => Ok((self.host.as_str(), port)),
            _ => Err(DescriptorError::InvalidPort(self.port)),
        }
    }
}

impl fmt::Display for BackendServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Everything needed to open a room session on the engine.
///
/// `Debug` output redacts the password and token so the descriptor can be
/// logged safely.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SessionDescriptor {
    pub room_id: i32,
    pub server: BackendServer,
    pub application_name: String,
    pub version: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Base64 encoded.
    #[serde(default)]
    pub token: Option<String>,
    /// Free-form metadata.  Accepted for compatibility; never sent to the
    /// engine.
    #[serde(default)]
    pub information: Option<HashMap<String, String>>,
}

impl SessionDescriptor {
    /// Parses a descriptor from the raw bytes of a text or binary message.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Malformed`] if the bytes are not valid JSON
    /// or a required field is missing or has the wrong type.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DescriptorError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl fmt::Debug for SessionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDescriptor")
            .field("room_id", &self.room_id)
            .field("server", &self.server)
            .field("application_name", &self.application_name)
            .field("version", &self.version)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("information", &self.information)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{"room_id":7,"server":{"host":"127.0.0.1","port":9000},"application_name":"demo","version":"1.0"}"#;

    #[test]
    fn test_minimal_descriptor_parses_with_optional_fields_absent() {
        // Act
        let d = SessionDescriptor::from_json(MINIMAL.as_bytes()).unwrap();

        // Assert
        assert_eq!(d.room_id, 7);
        assert_eq!(d.server.host, "127.0.0.1");
        assert_eq!(d.server.port, 9000);
        assert_eq!(d.application_name, "demo");
        assert_eq!(d.version, "1.0");
        assert!(d.password.is_none());
        assert!(d.token.is_none());
        assert!(d.information.is_none());
    }

    #[test]
    fn test_full_descriptor_parses_every_field() {
        let json = r#"{
            "room_id": -3,
            "server": {"host": "engine.local", "port": 4000},
            "application_name": "game",
            "version": "2.1",
            "password": "pw",
            "token": "AQID",
            "information": {"nick": "alice"}
        }"#;

        let d = SessionDescriptor::from_json(json.as_bytes()).unwrap();

        assert_eq!(d.room_id, -3);
        assert_eq!(d.password.as_deref(), Some("pw"));
        assert_eq!(d.token.as_deref(), Some("AQID"));
        assert_eq!(
            d.information.unwrap().get("nick").map(String::as_str),
            Some("alice")
        );
    }

    #[test]
    fn test_null_optional_fields_are_absent() {
        let json = r#"{"room_id":1,"server":{"host":"h","port":1},"application_name":"a","version":"v","password":null,"token":null}"#;
        let d = SessionDescriptor::from_json(json.as_bytes()).unwrap();
        assert!(d.password.is_none());
        assert!(d.token.is_none());
    }

    #[test]
    fn test_not_json_is_malformed() {
        let result = SessionDescriptor::from_json(b"hello");
        assert!(matches!(result, Err(DescriptorError::Malformed(_))));
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let json = r#"{"room_id":7,"application_name":"demo","version":"1.0"}"#;
        assert!(SessionDescriptor::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn test_room_id_beyond_i32_is_malformed() {
        let json = r#"{"room_id":4294967296,"server":{"host":"h","port":1},"application_name":"a","version":"v"}"#;
        assert!(SessionDescriptor::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn test_dial_target_accepts_valid_port() {
        let server = BackendServer {
            host: "127.0.0.1".to_string(),
            port: 9000,
        };
        assert_eq!(server.dial_target().unwrap(), ("127.0.0.1", 9000));
    }

    #[test]
    fn test_dial_target_rejects_out_of_range_ports() {
        for port in [0, -1, 65536] {
            let server = BackendServer {
                host: "h".to_string(),
                port,
            };
            assert!(
                matches!(server.dial_target(), Err(DescriptorError::InvalidPort(p)) if p == port),
                "port {port}"
            );
        }
    }

    #[test]
    fn test_display_brackets_ipv6_hosts() {
        let server = BackendServer {
            host: "::1".to_string(),
            port: 9000,
        };
        assert_eq!(server.to_string(), "[::1]:9000");
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let mut d = SessionDescriptor::from_json(MINIMAL.as_bytes()).unwrap();
        d.password = Some("hunter2".to_string());
        d.token = Some("c2VjcmV0".to_string());

        let rendered = format!("{d:?}");

        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("c2VjcmV0"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("demo"));
    }
}
