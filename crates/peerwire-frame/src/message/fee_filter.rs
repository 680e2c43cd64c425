use bytes::{BufMut, BytesMut};

use super::{version, Message};
use crate::command::MessageType;
use crate::error::{CodecError, Result};
use crate::reader::ByteReader;

/// Minimum fee rate (satoshis per kilobyte) for relayed transactions (BIP133).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeFilter {
    pub minimum_fee: u64,
}

impl Message for FeeFilter {
    const TYPE: MessageType = MessageType::FeeFilter;

    fn parse(version: u32, reader: &mut ByteReader<'_>) -> Result<Self> {
        if version < version::BIP133 {
            return Err(CodecError::UnsupportedVersion {
                command: "feefilter",
                version,
                minimum: version::BIP133,
            });
        }

        let minimum_fee = reader.read_u64_le()?;
        // Above total supply in satoshis; no honest peer sends it.
        if minimum_fee > 21_000_000 * 100_000_000 {
            return Err(CodecError::InvalidPayload {
                command: "feefilter",
                reason: format!("fee rate {minimum_fee} exceeds money supply"),
            });
        }
        Ok(Self { minimum_fee })
    }

    fn serialize(&self, _version: u32, dst: &mut BytesMut) {
        dst.put_u64_le(self.minimum_fee);
    }
}
