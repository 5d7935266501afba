//! Client side of the WebSocket opening handshake (RFC 6455 Section 4).
//!
//! Builds the HTTP/1.1 upgrade request with a fresh random nonce per
//! connection and validates the server's `101 Switching Protocols` response,
//! including the `Sec-WebSocket-Accept` value.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

/// The WebSocket GUID used in the Sec-WebSocket-Accept calculation (RFC 6455).
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Computes the Sec-WebSocket-Accept value from the client's Sec-WebSocket-Key.
///
/// The accept key is calculated as: Base64(SHA-1(key + GUID))
///
/// # Example
///
/// ```
/// use rewsock::protocol::compute_accept_key;
///
/// let key = "dGhlIHNhbXBsZSBub25jZQ==";
/// assert_eq!(compute_accept_key(key), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Generate a random 16-byte nonce, base64-encoded.
/// Falls back to system time if getrandom fails.
fn random_nonce() -> String {
    let mut bytes = [0u8; 16];
    if getrandom::getrandom(&mut bytes).is_err() {
        use std::time::{SystemTime, UNIX_EPOCH};
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0x5DEECE66D);
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = ((seed >> (i * 8)) & 0xFF) as u8;
        }
    }
    BASE64.encode(bytes)
}

/// Parse HTTP headers from an iterator of lines into a case-insensitive map.
fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }
    headers
}

/// One client handshake attempt, holding the per-connection nonce.
#[derive(Debug, Clone)]
pub struct ClientHandshake {
    key: String,
}

impl ClientHandshake {
    /// Create a handshake with a fresh random nonce.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            key: random_nonce(),
        }
    }

    /// Create a handshake with a fixed key. Intended for tests.
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The Sec-WebSocket-Key value sent to the server.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Render the HTTP/1.1 upgrade request.
    ///
    /// `host` is the value for the `Host` header (host, or host:port for a
    /// non-default port).
    #[must_use]
    pub fn request(&self, host: &str, path: &str) -> String {
        format!(
            "GET {path} HTTP/1.1\r\n\
             Host: {host}\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {key}\r\n\
             Sec-WebSocket-Version: 13\r\n\
             \r\n",
            key = self.key,
        )
    }

    /// Check the server's accept value against this handshake's nonce.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandshake`] on a mismatch.
    pub fn verify(&self, response: &HandshakeResponse) -> Result<()> {
        let expected = compute_accept_key(&self.key);
        if response.accept != expected {
            return Err(Error::InvalidHandshake(format!(
                "Sec-WebSocket-Accept mismatch: expected {expected}, got {}",
                response.accept
            )));
        }
        Ok(())
    }
}

/// Parsed WebSocket handshake response from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// The Sec-WebSocket-Accept header value.
    pub accept: String,
}

impl HandshakeResponse {
    /// Parse a handshake response from raw HTTP data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandshake`] if:
    /// - The data is not valid UTF-8.
    /// - The status line is missing or is not `HTTP/1.1 101`.
    /// - The `Upgrade` header is not `websocket`.
    /// - The `Connection` header does not contain `upgrade`.
    /// - The `Sec-WebSocket-Accept` header is missing.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::InvalidHandshake("Invalid UTF-8".into()))?;

        let mut lines = text.lines();

        let status_line = lines
            .next()
            .ok_or_else(|| Error::InvalidHandshake("Empty response".into()))?;
        if !status_line.starts_with("HTTP/1.1 101") {
            return Err(Error::InvalidHandshake(format!(
                "Expected 101 Switching Protocols, got: {status_line}"
            )));
        }

        let headers = parse_headers(lines);

        let upgrade = headers
            .get("upgrade")
            .ok_or_else(|| Error::InvalidHandshake("Missing Upgrade header".into()))?;
        if !upgrade.eq_ignore_ascii_case("websocket") {
            return Err(Error::InvalidHandshake(format!(
                "Invalid Upgrade header: {upgrade}"
            )));
        }

        let connection = headers
            .get("connection")
            .ok_or_else(|| Error::InvalidHandshake("Missing Connection header".into()))?;
        if !connection.to_lowercase().contains("upgrade") {
            return Err(Error::InvalidHandshake(format!(
                "Invalid Connection header: {connection}"
            )));
        }

        let accept = headers
            .get("sec-websocket-accept")
            .ok_or_else(|| Error::InvalidHandshake("Missing Sec-WebSocket-Accept header".into()))?
            .clone();

        Ok(Self { accept })
    }
}
