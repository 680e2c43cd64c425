use bytes::BytesMut;

use super::{version, Message};
use crate::command::MessageType;
use crate::error::{CodecError, Result};
use crate::reader::ByteReader;

/// Version acknowledgement. Empty payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verack;

impl Message for Verack {
    const TYPE: MessageType = MessageType::Verack;

    fn parse(_version: u32, _reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self)
    }

    fn serialize(&self, _version: u32, _dst: &mut BytesMut) {}
}

/// Request to announce blocks by header (BIP130). Empty payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendHeaders;

impl Message for SendHeaders {
    const TYPE: MessageType = MessageType::SendHeaders;

    fn parse(version: u32, _reader: &mut ByteReader<'_>) -> Result<Self> {
        if version < version::BIP130 {
            return Err(CodecError::UnsupportedVersion {
                command: "sendheaders",
                version,
                minimum: version::BIP130,
            });
        }
        Ok(Self)
    }

    fn serialize(&self, _version: u32, _dst: &mut BytesMut) {}
}
