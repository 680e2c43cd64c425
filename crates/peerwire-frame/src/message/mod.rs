//! Typed protocol messages.
//!
//! A channel depends only on [`Message`]: parse a payload given the negotiated
//! protocol version, or serialize one for sending. The few messages defined
//! here are the ones a channel needs to keep itself alive; every other codec
//! lives with its owner and implements the same trait.

use bytes::BytesMut;

use crate::command::MessageType;
use crate::error::Result;
use crate::reader::ByteReader;

mod fee_filter;
mod ping;
mod verack;

pub use fee_filter::FeeFilter;
pub use ping::{Ping, Pong};
pub use verack::{SendHeaders, Verack};

/// Protocol versions at which message formats changed.
pub mod version {
    /// BIP31: ping carries a nonce, pong exists.
    pub const BIP31: u32 = 60001;
    /// BIP130: sendheaders.
    pub const BIP130: u32 = 70012;
    /// BIP133: feefilter.
    pub const BIP133: u32 = 70013;
    /// Highest version this implementation speaks.
    pub const MAXIMUM: u32 = 70015;
}

/// A message with a wire representation.
pub trait Message: Sized + Send + Sync + 'static {
    /// Type named in the heading's command field.
    const TYPE: MessageType;

    /// Parse from `reader` as encoded at protocol `version`.
    ///
    /// Implementations consume exactly the bytes they understand; leftovers
    /// are detected by the caller.
    fn parse(version: u32, reader: &mut ByteReader<'_>) -> Result<Self>;

    /// Append the payload encoding for protocol `version` to `dst`.
    fn serialize(&self, version: u32, dst: &mut BytesMut);

    /// Command name carried in the heading.
    fn command() -> &'static str {
        Self::TYPE.command()
    }
}
