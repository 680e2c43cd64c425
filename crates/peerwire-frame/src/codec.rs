use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::checksum;
use crate::command::{self, MessageType, COMMAND_SIZE};
use crate::error::{CodecError, Result};

/// Heading: magic (4) + command (12) + payload size (4) + checksum (4) = 24 bytes.
pub const HEADER_SIZE: usize = 24;

/// Fixed-size prefix of every protocol message.
///
/// Wire format (multi-byte fields little-endian):
/// ```text
/// ┌────────────┬──────────────────────┬──────────────┬────────────┐
/// │ Magic (4B) │ Command (12B, ASCII, │ Payload size │ Checksum   │
/// │            │ NUL-padded)          │ (4B)         │ (4B)       │
/// └────────────┴──────────────────────┴──────────────┴────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading {
    pub magic: u32,
    pub command: [u8; COMMAND_SIZE],
    pub payload_size: u32,
    pub checksum: u32,
}

impl Heading {
    /// Build the heading that describes `payload`.
    pub fn new(magic: u32, command: &str, payload: &[u8]) -> Result<Self> {
        let command_field = command::to_field(command)
            .ok_or_else(|| CodecError::InvalidCommand(command.to_string()))?;
        let payload_size = u32::try_from(payload.len()).map_err(|_| CodecError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        })?;

        Ok(Self {
            magic,
            command: command_field,
            payload_size,
            checksum: checksum(payload),
        })
    }

    /// Decode a heading from the first [`HEADER_SIZE`] bytes of `src`.
    ///
    /// Only fails on short input. A decoded heading must still pass
    /// [`Heading::is_valid`] before use.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() < HEADER_SIZE {
            return Err(CodecError::Truncated {
                needed: HEADER_SIZE,
                remaining: src.len(),
            });
        }

        let mut command = [0u8; COMMAND_SIZE];
        command.copy_from_slice(&src[4..16]);

        Ok(Self {
            magic: u32::from_le_bytes([src[0], src[1], src[2], src[3]]),
            command,
            payload_size: u32::from_le_bytes([src[16], src[17], src[18], src[19]]),
            checksum: u32::from_le_bytes([src[20], src[21], src[22], src[23]]),
        })
    }

    /// Encode into wire format.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..16].copy_from_slice(&self.command);
        out[16..20].copy_from_slice(&self.payload_size.to_le_bytes());
        out[20..24].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }

    /// True if the command field is a well-formed, NUL-padded ASCII name.
    ///
    /// Well-formed names outside the catalogue are valid; they map to
    /// [`MessageType::Unknown`].
    pub fn is_valid(&self) -> bool {
        command::is_well_formed(&self.command)
    }

    /// Command name with padding removed. Empty if the field is malformed.
    pub fn command(&self) -> &str {
        if !self.is_valid() {
            return "";
        }
        let end = self
            .command
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(COMMAND_SIZE);
        std::str::from_utf8(&self.command[..end]).unwrap_or("")
    }

    /// Message type named by the command field.
    pub fn message_type(&self) -> MessageType {
        MessageType::from_command(self.command())
    }

    pub fn payload_size(&self) -> usize {
        self.payload_size as usize
    }
}

/// Encode a complete message (heading followed by payload).
pub fn encode_message(magic: u32, command: &str, payload: &[u8]) -> Result<Bytes> {
    let heading = Heading::new(magic, command, payload)?;
    let mut dst = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    dst.put_slice(&heading.encode());
    dst.put_slice(payload);
    Ok(dst.freeze())
}
