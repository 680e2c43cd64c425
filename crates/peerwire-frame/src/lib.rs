//! Bitcoin-style message framing.
//!
//! Every protocol message is prefixed with a fixed 24-byte heading:
//! - A 4-byte little-endian network identifier ("magic")
//! - A 12-byte NUL-padded ASCII command name
//! - A 4-byte little-endian payload length
//! - A 4-byte checksum (first four bytes of double SHA-256 of the payload)
//!
//! Headings are pure values; decoding, validation and checksumming have no
//! side effects and are safe to fuzz directly.

pub mod checksum;
pub mod codec;
pub mod command;
pub mod error;
pub mod message;
pub mod network;
pub mod reader;

pub use checksum::{checksum, double_hash};
pub use codec::{encode_message, Heading, HEADER_SIZE};
pub use command::{MessageType, COMMAND_SIZE};
pub use error::{CodecError, Result};
pub use message::{version, FeeFilter, Message, Ping, Pong, SendHeaders, Verack};
pub use network::{maximum_payload_size, Network, MAX_PAYLOAD_SIZE};
pub use reader::ByteReader;
