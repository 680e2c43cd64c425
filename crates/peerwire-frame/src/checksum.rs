use sha2::{Digest, Sha256};

/// SHA-256 applied twice.
pub fn double_hash(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Wire checksum: the first four bytes of `double_hash(payload)`, read little-endian.
pub fn checksum(payload: &[u8]) -> u32 {
    let hash = double_hash(payload);
    u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_checksum() {
        // Every empty-payload message (verack, getaddr, ...) carries 5d f6 e0 e2.
        assert_eq!(checksum(&[]).to_le_bytes(), [0x5d, 0xf6, 0xe0, 0xe2]);
    }

    #[test]
    fn double_hash_of_empty() {
        let hash = double_hash(&[]);
        assert_eq!(&hash[..4], &[0x5d, 0xf6, 0xe0, 0xe2]);
        assert_eq!(&hash[28..], &[0x5d, 0x4c, 0x94, 0x56]);
    }

    #[test]
    fn deterministic() {
        let payload = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(checksum(payload), checksum(payload));
    }

    #[test]
    fn single_bit_flips_change_checksum() {
        let corpus: [&[u8]; 4] = [
            b"\x00",
            b"ping",
            &[0xAB; 64],
            b"\x01\x02\x03\x04\x05\x06\x07\x08",
        ];

        for payload in corpus {
            let original = checksum(payload);
            for byte in 0..payload.len() {
                for bit in 0..8 {
                    let mut mutated = payload.to_vec();
                    mutated[byte] ^= 1 << bit;
                    assert_ne!(
                        checksum(&mutated),
                        original,
                        "flip of byte {byte} bit {bit} kept checksum"
                    );
                }
            }
        }
    }
}
