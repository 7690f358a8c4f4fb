//! Control datagram wire format
//!
//! One UDP datagram per update:
//!
//! ```text
//! <device name bytes> 0x0D 0x0A <x: f32 big-endian> <y: f32 big-endian>
//! ```
//!
//! There is no acknowledgement, retry, or sequencing. The receiver keeps only
//! the newest value per device.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Well-known UDP port of the input server
pub const CONTROL_PORT: u16 = 38228;

/// Separator between the device name and the payload
pub const SEPARATOR: &[u8; 2] = b"\r\n";

/// Two big-endian f32 values
pub const PAYLOAD_LEN: usize = 8;

/// Largest datagram the input server reads
pub const MAX_DATAGRAM_LEN: usize = 1024;

/// A decoded control update
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPacket {
    /// Device identifier
    pub name: String,
    pub x: f32,
    pub y: f32,
}

impl ControlPacket {
    pub fn new(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }
}

/// Serialize a `(name, x, y)` triple
pub fn encode(name: &str, x: f32, y: f32) -> Result<Bytes, ProtocolError> {
    let name = name.as_bytes();
    if find_separator(name).is_some() {
        return Err(ProtocolError::SeparatorInName);
    }

    let mut buf = BytesMut::with_capacity(name.len() + SEPARATOR.len() + PAYLOAD_LEN);
    buf.put_slice(name);
    buf.put_slice(SEPARATOR);
    buf.put_f32(x);
    buf.put_f32(y);
    Ok(buf.freeze())
}

/// Parse a datagram payload
///
/// The name ends at the first separator; exactly eight bytes must follow it.
pub fn decode(datagram: &[u8]) -> Result<ControlPacket, ProtocolError> {
    let split = find_separator(datagram).ok_or(ProtocolError::MissingSeparator)?;
    let (name, rest) = datagram.split_at(split);
    let mut payload = &rest[SEPARATOR.len()..];

    if payload.len() != PAYLOAD_LEN {
        return Err(ProtocolError::PayloadLength(payload.len()));
    }

    let name = std::str::from_utf8(name).map_err(|_| ProtocolError::InvalidName)?;
    let x = payload.get_f32();
    let y = payload.get_f32();

    Ok(ControlPacket::new(name, x, y))
}

fn find_separator(bytes: &[u8]) -> Option<usize> {
    bytes.windows(SEPARATOR.len()).position(|w| w == SEPARATOR)
}

/// Wire format errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("datagram has no name separator")]
    MissingSeparator,

    #[error("expected 8 payload bytes, got {0}")]
    PayloadLength(usize),

    #[error("device name is not valid UTF-8")]
    InvalidName,

    #[error("device name contains the separator sequence")]
    SeparatorInName,
}
