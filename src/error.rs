//! Error types for the WebSocket client.
//!
//! All recoverable errors (transport, handshake, framing) are funneled into
//! the client's reconnect loop and surfaced through the `on_error` handler;
//! only [`Error::InvalidUrl`] is returned synchronously from construction.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during WebSocket client operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The URL could not be parsed into scheme/host/port/path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// I/O error on the underlying transport.
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid WebSocket handshake response.
    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),

    /// Frame length form or payload size beyond the supported 16-bit range.
    ///
    /// The 64-bit extended length form is rejected outright, never truncated.
    #[error("Unsupported frame length: {0}")]
    UnsupportedFrameLength(String),

    /// Invalid opcode value.
    #[error("Invalid opcode: {0:#x}")]
    InvalidOpcode(u8),

    /// Reserved opcode used.
    #[error("Reserved opcode: {0:#x}")]
    ReservedOpcode(u8),

    /// Incomplete frame data.
    #[error("Incomplete frame: need {needed} more bytes")]
    IncompleteFrame {
        /// Number of additional bytes needed.
        needed: usize,
    },

    /// Invalid UTF-8 in a text frame.
    #[error("Invalid UTF-8 in text frame")]
    InvalidUtf8,

    /// The peer closed the connection.
    #[error("Connection closed: {0:?}")]
    ConnectionClosed(Option<u16>),

    /// A send was attempted while the connection is not open.
    ///
    /// The message is dropped, never queued.
    #[error("Not connected: message dropped")]
    NotConnected,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}
