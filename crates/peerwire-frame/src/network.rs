//! Network identification and the payload limits derived from it.

/// Wire identifier (magic) of each known network, little-endian as decoded.
pub const MAINNET_IDENTIFIER: u32 = 0xe8f3_e1e3;
pub const TESTNET_IDENTIFIER: u32 = 0xf4f3_e5f4;
pub const REGTEST_IDENTIFIER: u32 = 0xfabf_b5da;
pub const TESTNET4_IDENTIFIER: u32 = 0xafda_b7e2;
pub const SCALENET_IDENTIFIER: u32 = 0xa2e1_afc3;

/// Chipnet shares the testnet4 identifier and is told apart by this inbound port.
pub const CHIPNET_PORT: u16 = 48333;

/// Absolute payload ceiling. Exceeding it is worth logging but is not by
/// itself a protocol violation; the per-network limit decides rejection.
pub const MAX_PAYLOAD_SIZE: usize = 33_554_432;

/// Largest inventory-style payload: a 3-byte count prefix plus 50,000
/// vectors of (u32 type, 32-byte hash).
pub const MAX_INVENTORY_PAYLOAD_SIZE: usize = 3 + (4 + 32) * 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
    Testnet4,
    Scalenet,
    Chipnet,
    Other(u32),
}

impl Network {
    pub fn identify(identifier: u32, is_alt_port: bool) -> Self {
        match identifier {
            MAINNET_IDENTIFIER => Self::Mainnet,
            TESTNET_IDENTIFIER => Self::Testnet,
            REGTEST_IDENTIFIER => Self::Regtest,
            TESTNET4_IDENTIFIER if is_alt_port => Self::Chipnet,
            TESTNET4_IDENTIFIER => Self::Testnet4,
            SCALENET_IDENTIFIER => Self::Scalenet,
            other => Self::Other(other),
        }
    }

    /// Default maximum block size accepted on this network.
    pub fn max_block_size(self) -> usize {
        match self {
            Self::Testnet4 | Self::Chipnet => 2_000_000,
            Self::Scalenet => 256_000_000,
            Self::Mainnet | Self::Testnet | Self::Regtest | Self::Other(_) => 32_000_000,
        }
    }
}

/// Largest payload a peer may announce on the given network.
///
/// The bound does not vary by protocol version; the parameter is accepted so
/// callers need not special-case future version-dependent limits.
pub fn maximum_payload_size(_protocol_version: u32, identifier: u32, is_alt_port: bool) -> usize {
    let block = Network::identify(identifier, is_alt_port).max_block_size();
    block.max(MAX_INVENTORY_PAYLOAD_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_known_networks() {
        assert_eq!(Network::identify(MAINNET_IDENTIFIER, false), Network::Mainnet);
        assert_eq!(Network::identify(TESTNET4_IDENTIFIER, false), Network::Testnet4);
        assert_eq!(Network::identify(TESTNET4_IDENTIFIER, true), Network::Chipnet);
        assert_eq!(Network::identify(0xd9b4_bef9, false), Network::Other(0xd9b4_bef9));
    }

    #[test]
    fn alt_port_only_matters_for_shared_identifier() {
        assert_eq!(Network::identify(MAINNET_IDENTIFIER, true), Network::Mainnet);
    }

    #[test]
    fn maximum_payload_follows_block_size() {
        assert_eq!(maximum_payload_size(70015, MAINNET_IDENTIFIER, false), 32_000_000);
        assert_eq!(maximum_payload_size(70015, SCALENET_IDENTIFIER, false), 256_000_000);
        assert_eq!(maximum_payload_size(70015, TESTNET4_IDENTIFIER, true), 2_000_000);
    }

    #[test]
    fn maximum_payload_never_below_inventory_bound() {
        assert!(maximum_payload_size(0, TESTNET4_IDENTIFIER, false) >= MAX_INVENTORY_PAYLOAD_SIZE);
        assert_eq!(MAX_INVENTORY_PAYLOAD_SIZE, 1_800_003);
    }

    #[test]
    fn scalenet_exceeds_absolute_ceiling() {
        assert!(maximum_payload_size(70015, SCALENET_IDENTIFIER, false) > MAX_PAYLOAD_SIZE);
    }
}
