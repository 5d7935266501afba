//! WebSocket protocol core (RFC 6455): framing, masking, handshake.

pub mod frame;
pub mod handshake;
pub mod mask;
pub mod opcode;

pub use frame::{Frame, MAX_PAYLOAD_LEN};
pub use handshake::{ClientHandshake, HandshakeResponse, WS_GUID, compute_accept_key};
pub use mask::apply_mask;
pub use opcode::OpCode;

/// Normal closure status code (RFC 6455 Section 7.4).
pub const CLOSE_NORMAL: u16 = 1000;

/// Abnormal closure status code: the connection was lost without a close
/// frame exchange. Never appears on the wire.
pub const CLOSE_ABNORMAL: u16 = 1006;
