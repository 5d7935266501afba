//! Client configuration and URL parsing.

use std::time::Duration;

use crate::error::{Error, Result};

/// WebSocket URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain TCP (`ws://`), default port 80.
    Ws,
    /// TLS (`wss://`), default port 443. The client performs no TLS
    /// negotiation itself; a TLS-capable transport must be supplied.
    Wss,
}

impl Scheme {
    /// Default port for this scheme.
    #[inline]
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Scheme::Ws => 80,
            Scheme::Wss => 443,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Ws => write!(f, "ws"),
            Scheme::Wss => write!(f, "wss"),
        }
    }
}

/// A parsed WebSocket endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// URL scheme.
    pub scheme: Scheme,
    /// Host name or address.
    pub host: String,
    /// TCP port (1-65535).
    pub port: u16,
    /// Request path including any query string. Defaults to "/".
    pub path: String,
}

impl Endpoint {
    /// Parse a `ws://` or `wss://` URL.
    ///
    /// The port defaults to 80 for `ws` and 443 for `wss` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the scheme is unknown, the host is
    /// missing, or the port is not a valid non-zero 16-bit integer.
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, rest) = if let Some(rest) = url.strip_prefix("ws://") {
            (Scheme::Ws, rest)
        } else if let Some(rest) = url.strip_prefix("wss://") {
            (Scheme::Wss, rest)
        } else {
            return Err(Error::InvalidUrl(format!(
                "expected ws:// or wss:// scheme in {url:?}"
            )));
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], rest[idx..].to_string()),
            None => (rest, "/".to_string()),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port_str)) => {
                let port: u16 = port_str
                    .parse()
                    .map_err(|_| Error::InvalidUrl(format!("invalid port {port_str:?}")))?;
                if port == 0 {
                    return Err(Error::InvalidUrl("port must be non-zero".into()));
                }
                (host, port)
            }
            None => (authority, scheme.default_port()),
        };

        if host.is_empty() {
            return Err(Error::InvalidUrl(format!("missing host in {url:?}")));
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            path,
        })
    }

    /// Value for the `Host` header: `host` alone on the scheme's default
    /// port, `host:port` otherwise.
    #[must_use]
    pub fn authority(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority(), self.path)
    }
}

/// WebSocket client configuration.
///
/// Immutable after the client is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Delay between reconnection attempts.
    ///
    /// The interval is fixed (no backoff). Default: 5 seconds.
    pub retry_interval: Duration,

    /// Maximum size of the handshake response in bytes.
    ///
    /// Default: 8 KB (8192)
    pub max_handshake_size: usize,

    /// Read buffer size (in bytes).
    ///
    /// Default: 8 KB (8192)
    pub read_buffer_size: usize,

    /// Write buffer size (in bytes).
    ///
    /// Default: 8 KB (8192)
    pub write_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(5),
            max_handshake_size: 8192,
            read_buffer_size: 8192,
            write_buffer_size: 8192,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reconnect interval.
    #[must_use]
    pub const fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set the maximum handshake response size.
    #[must_use]
    pub const fn with_max_handshake_size(mut self, size: usize) -> Self {
        self.max_handshake_size = size;
        self
    }

    /// Set the read buffer size.
    #[must_use]
    pub const fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set the write buffer size.
    #[must_use]
    pub const fn with_write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }
}
