//! WebSocket frame parsing and serialization (RFC 6455).
//!
//! The codec supports the 1-byte and 16-bit extended length forms. A header
//! declaring the 64-bit form (length marker 127) is rejected with
//! [`Error::UnsupportedFrameLength`] before any further bytes are consumed,
//! on both the decode and encode paths.

use crate::error::{Error, Result};
use crate::protocol::OpCode;
use crate::protocol::mask::apply_mask;

/// Largest payload the codec will encode or decode (16-bit length form).
pub const MAX_PAYLOAD_LEN: usize = 65535;

#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    fin: bool,
    opcode: OpCode,
    mask: Option<[u8; 4]>,
    payload_len: usize,
    header_len: usize,
}

/// Parse a frame header from the start of `buf`.
fn parse_header(buf: &[u8]) -> Result<FrameHeader> {
    if buf.len() < 2 {
        return Err(Error::IncompleteFrame {
            needed: 2 - buf.len(),
        });
    }

    let byte0 = buf[0];
    let byte1 = buf[1];

    let fin = (byte0 & 0x80) != 0;
    let opcode = OpCode::from_u8(byte0 & 0x0F)?;
    let masked = (byte1 & 0x80) != 0;
    let len7 = byte1 & 0x7F;

    let (payload_len, len_size) = match len7 {
        0..=125 => (len7 as usize, 0),
        126 => {
            if buf.len() < 4 {
                return Err(Error::IncompleteFrame {
                    needed: 4 - buf.len(),
                });
            }
            (u16::from_be_bytes([buf[2], buf[3]]) as usize, 2)
        }
        _ => {
            return Err(Error::UnsupportedFrameLength(
                "64-bit extended length form is not supported".into(),
            ));
        }
    };

    let mask_offset = 2 + len_size;
    let header_len = if masked { mask_offset + 4 } else { mask_offset };

    if buf.len() < header_len {
        return Err(Error::IncompleteFrame {
            needed: header_len - buf.len(),
        });
    }

    let mask = masked.then(|| {
        [
            buf[mask_offset],
            buf[mask_offset + 1],
            buf[mask_offset + 2],
            buf[mask_offset + 3],
        ]
    });

    Ok(FrameHeader {
        fin,
        opcode,
        mask,
        payload_len,
        header_len,
    })
}

/// A single WebSocket frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: OpCode,
    payload: Vec<u8>,
}

impl Frame {
    /// Create a frame with the given opcode and payload.
    #[must_use]
    pub fn new(fin: bool, opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            fin,
            opcode,
            payload,
        }
    }

    /// Create a final text frame.
    #[must_use]
    pub fn text(data: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Text, data.into())
    }

    /// Create a close frame carrying a status code and UTF-8 reason.
    #[must_use]
    pub fn close(code: u16, reason: &str) -> Self {
        let mut payload = code.to_be_bytes().to_vec();
        payload.extend_from_slice(reason.as_bytes());
        Self::new(true, OpCode::Close, payload)
    }

    /// Payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Status code carried by a close frame, if any.
    ///
    /// Returns `None` when the payload is too short to hold a code.
    #[must_use]
    pub fn close_code(&self) -> Option<u16> {
        if self.payload.len() >= 2 {
            Some(u16::from_be_bytes([self.payload[0], self.payload[1]]))
        } else {
            None
        }
    }

    /// Reason string carried by a close frame, if any.
    #[must_use]
    pub fn close_reason(&self) -> Option<&str> {
        if self.payload.len() > 2 {
            std::str::from_utf8(&self.payload[2..]).ok()
        } else {
            None
        }
    }

    /// Parse a frame from the start of `buf`.
    ///
    /// Returns the frame and the number of bytes consumed. Masked payloads
    /// are unmasked during parsing.
    ///
    /// # Errors
    ///
    /// - `Error::IncompleteFrame` when `buf` does not yet hold a whole frame
    /// - `Error::UnsupportedFrameLength` for the 64-bit length form
    /// - `Error::InvalidOpcode` / `Error::ReservedOpcode` for bad opcodes
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        let header = parse_header(buf)?;
        let total = header.header_len + header.payload_len;

        if buf.len() < total {
            return Err(Error::IncompleteFrame {
                needed: total - buf.len(),
            });
        }

        let mut payload = buf[header.header_len..total].to_vec();
        if let Some(mask) = header.mask {
            apply_mask(&mut payload, mask);
        }

        Ok((
            Frame {
                fin: header.fin,
                opcode: header.opcode,
                payload,
            },
            total,
        ))
    }

    /// Serialize the frame into `buf`, returning the number of bytes written.
    ///
    /// When `mask` is given the key is written into the header and the
    /// payload is XOR-ed; client-to-server frames must always be masked.
    ///
    /// # Errors
    ///
    /// - `Error::UnsupportedFrameLength` if the payload exceeds
    ///   [`MAX_PAYLOAD_LEN`]
    /// - `Error::IncompleteFrame` if `buf` is too small
    pub fn write(&self, buf: &mut [u8], mask: Option<[u8; 4]>) -> Result<usize> {
        let payload_len = self.payload.len();
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(Error::UnsupportedFrameLength(format!(
                "payload of {payload_len} bytes exceeds {MAX_PAYLOAD_LEN}"
            )));
        }

        let total = self.wire_size(mask.is_some());
        if buf.len() < total {
            return Err(Error::IncompleteFrame {
                needed: total - buf.len(),
            });
        }

        let mut byte0 = self.opcode.as_u8();
        if self.fin {
            byte0 |= 0x80;
        }
        buf[0] = byte0;

        let mut offset = 2;
        if payload_len < 126 {
            buf[1] = payload_len as u8;
        } else {
            buf[1] = 126;
            buf[2..4].copy_from_slice(&(payload_len as u16).to_be_bytes());
            offset += 2;
        }

        if let Some(key) = mask {
            buf[1] |= 0x80;
            buf[offset..offset + 4].copy_from_slice(&key);
            offset += 4;
        }

        buf[offset..offset + payload_len].copy_from_slice(&self.payload);
        if let Some(key) = mask {
            apply_mask(&mut buf[offset..offset + payload_len], key);
        }

        Ok(total)
    }

    /// Number of bytes `write` will produce for this frame.
    ///
    /// Assumes the payload fits the 16-bit length form; `write` rejects
    /// anything larger.
    #[must_use]
    pub fn wire_size(&self, masked: bool) -> usize {
        let payload_len = self.payload.len();
        let len_size = if payload_len < 126 { 0 } else { 2 };
        let mask_size = if masked { 4 } else { 0 };
        2 + len_size + mask_size + payload_len
    }
}
