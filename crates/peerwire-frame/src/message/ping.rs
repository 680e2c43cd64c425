use bytes::{BufMut, BytesMut};

use super::{version, Message};
use crate::command::MessageType;
use crate::error::{CodecError, Result};
use crate::reader::ByteReader;

/// Liveness probe. Carries a nonce from BIP31 on; empty before that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub nonce: Option<u64>,
}

impl Ping {
    pub fn new(nonce: u64) -> Self {
        Self { nonce: Some(nonce) }
    }
}

impl Message for Ping {
    const TYPE: MessageType = MessageType::Ping;

    fn parse(version: u32, reader: &mut ByteReader<'_>) -> Result<Self> {
        if version < version::BIP31 {
            return Ok(Self { nonce: None });
        }
        Ok(Self {
            nonce: Some(reader.read_u64_le()?),
        })
    }

    fn serialize(&self, version: u32, dst: &mut BytesMut) {
        if version >= version::BIP31 {
            dst.put_u64_le(self.nonce.unwrap_or_default());
        }
    }
}

/// Reply to a [`Ping`], echoing its nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pong {
    pub nonce: u64,
}

impl Message for Pong {
    const TYPE: MessageType = MessageType::Pong;

    fn parse(version: u32, reader: &mut ByteReader<'_>) -> Result<Self> {
        if version < version::BIP31 {
            return Err(CodecError::UnsupportedVersion {
                command: "pong",
                version,
                minimum: version::BIP31,
            });
        }
        Ok(Self {
            nonce: reader.read_u64_le()?,
        })
    }

    fn serialize(&self, _version: u32, dst: &mut BytesMut) {
        dst.put_u64_le(self.nonce);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_with_nonce() {
        let payload = 0x0123_4567_89ab_cdefu64.to_le_bytes();
        let mut reader = ByteReader::new(&payload);

        let ping = Ping::parse(version::MAXIMUM, &mut reader).unwrap();
        assert_eq!(ping, Ping::new(0x0123_4567_89ab_cdef));
        assert!(reader.is_exhausted());
    }

    #[test]
    fn ping_before_bip31_reads_nothing() {
        let payload = [0xAA; 8];
        let mut reader = ByteReader::new(&payload);

        let ping = Ping::parse(version::BIP31 - 1, &mut reader).unwrap();
        assert_eq!(ping.nonce, None);
        assert_eq!(reader.remaining(), 8);

        let mut out = BytesMut::new();
        Ping::new(7).serialize(version::BIP31 - 1, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn ping_short_nonce_is_truncated() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        let err = Ping::parse(version::MAXIMUM, &mut reader).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { needed: 8, .. }));
    }

    #[test]
    fn pong_serializes_nonce() {
        let mut out = BytesMut::new();
        Pong { nonce: 42 }.serialize(version::MAXIMUM, &mut out);
        assert_eq!(out.as_ref(), &42u64.to_le_bytes());
    }

    #[test]
    fn pong_requires_bip31() {
        let mut reader = ByteReader::new(&[0u8; 8]);
        let err = Pong::parse(version::BIP31 - 1, &mut reader).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedVersion { minimum, .. } if minimum == version::BIP31));
    }
}
