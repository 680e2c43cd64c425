use peerwire_frame::network::{CHIPNET_PORT, MAINNET_IDENTIFIER};
use peerwire_frame::{maximum_payload_size, version};
use serde::{Deserialize, Serialize};

/// Node-level network settings consumed by every channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Highest protocol version offered; the initial negotiated version.
    pub protocol_maximum: u32,
    /// Network magic every heading must carry.
    pub identifier: u32,
    /// Port accepting inbound peers. 48333 selects chipnet limits.
    pub inbound_port: u16,
    /// Verify payload checksums against the heading.
    pub validate_checksum: bool,
    /// Dump (hex) the start of payloads that fail to parse.
    pub verbose: bool,
}

impl Settings {
    pub fn is_alt_port(&self) -> bool {
        self.inbound_port == CHIPNET_PORT
    }

    /// Largest payload a channel with these settings will read.
    pub fn maximum_payload_size(&self) -> usize {
        maximum_payload_size(self.protocol_maximum, self.identifier, self.is_alt_port())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            protocol_maximum: version::MAXIMUM,
            identifier: MAINNET_IDENTIFIER,
            inbound_port: 8333,
            validate_checksum: false,
            verbose: false,
        }
    }
}
