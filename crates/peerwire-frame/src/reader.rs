use bytes::Buf;

use crate::error::{CodecError, Result};

/// Cursor over a message payload.
///
/// Every read checks the remaining length first, so truncated payloads yield
/// [`CodecError::Truncated`] rather than panicking. After parsing, callers use
/// [`ByteReader::is_exhausted`] to detect trailing bytes.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    /// Read exactly `len` bytes, borrowing from the payload.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// True once every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.len() < needed {
            return Err(CodecError::Truncated {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let data = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
            0x0f,
        ];
        let mut reader = ByteReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16_le().unwrap(), 0x0302);
        assert_eq!(reader.read_u32_le().unwrap(), 0x0706_0504);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0f0e_0d0c_0b0a_0908);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn truncated_read_fails_without_consuming() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut reader = ByteReader::new(&data);

        let err = reader.read_u32_le().unwrap_err();
        assert_eq!(
            err,
            CodecError::Truncated {
                needed: 4,
                remaining: 3
            }
        );
        assert_eq!(reader.remaining(), 3);
        assert_eq!(reader.read_u16_le().unwrap(), 0xBBAA);
    }

    #[test]
    fn read_bytes_and_array() {
        let data = b"headtail!";
        let mut reader = ByteReader::new(data);

        assert_eq!(reader.read_bytes(4).unwrap(), b"head");
        assert_eq!(&reader.read_array::<4>().unwrap(), b"tail");
        assert_eq!(reader.remaining(), 1);
        assert!(!reader.is_exhausted());
    }

    #[test]
    fn empty_reader_is_exhausted() {
        let reader = ByteReader::new(&[]);
        assert!(reader.is_exhausted());
        assert_eq!(reader.remaining(), 0);
    }
}
