//! Protocol message types and their wire command names.
//!
//! Command names are ASCII, at most [`COMMAND_SIZE`] bytes, NUL-padded on the
//! wire. Names outside this catalogue map to [`MessageType::Unknown`] and are
//! skipped by receivers.

/// Size of the command field in a heading.
pub const COMMAND_SIZE: usize = 12;

/// Message type identified by a heading's command field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    Unknown,
    Address,
    Alert,
    Block,
    BlockTransactions,
    CompactBlock,
    FeeFilter,
    FilterAdd,
    FilterClear,
    FilterLoad,
    GetAddress,
    GetBlocks,
    GetBlockTransactions,
    GetData,
    GetHeaders,
    Headers,
    Inventory,
    MemoryPool,
    MerkleBlock,
    NotFound,
    Ping,
    Pong,
    Reject,
    SendCompact,
    SendHeaders,
    Transaction,
    Verack,
    Version,
    XVerack,
    XVersion,
}

const CATALOGUE: &[(MessageType, &str)] = &[
    (MessageType::Address, "addr"),
    (MessageType::Alert, "alert"),
    (MessageType::Block, "block"),
    (MessageType::BlockTransactions, "blocktxn"),
    (MessageType::CompactBlock, "cmpctblock"),
    (MessageType::FeeFilter, "feefilter"),
    (MessageType::FilterAdd, "filteradd"),
    (MessageType::FilterClear, "filterclear"),
    (MessageType::FilterLoad, "filterload"),
    (MessageType::GetAddress, "getaddr"),
    (MessageType::GetBlocks, "getblocks"),
    (MessageType::GetBlockTransactions, "getblocktxn"),
    (MessageType::GetData, "getdata"),
    (MessageType::GetHeaders, "getheaders"),
    (MessageType::Headers, "headers"),
    (MessageType::Inventory, "inv"),
    (MessageType::MemoryPool, "mempool"),
    (MessageType::MerkleBlock, "merkleblock"),
    (MessageType::NotFound, "notfound"),
    (MessageType::Ping, "ping"),
    (MessageType::Pong, "pong"),
    (MessageType::Reject, "reject"),
    (MessageType::SendCompact, "sendcmpct"),
    (MessageType::SendHeaders, "sendheaders"),
    (MessageType::Transaction, "tx"),
    (MessageType::Verack, "verack"),
    (MessageType::Version, "version"),
    (MessageType::XVerack, "xverack"),
    (MessageType::XVersion, "xversion"),
];

impl MessageType {
    /// Look up the message type for a command name.
    pub fn from_command(command: &str) -> Self {
        CATALOGUE
            .iter()
            .find(|(_, name)| *name == command)
            .map(|(kind, _)| *kind)
            .unwrap_or(Self::Unknown)
    }

    /// Wire command name. `Unknown` has none and returns an empty string.
    pub fn command(self) -> &'static str {
        CATALOGUE
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str("<unknown>"),
            other => f.write_str(other.command()),
        }
    }
}

/// Returns true if `bytes` is a well-formed command field: one or more
/// printable ASCII characters followed only by NUL padding.
pub fn is_well_formed(bytes: &[u8; COMMAND_SIZE]) -> bool {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(COMMAND_SIZE);
    end > 0
        && bytes[..end].iter().all(|b| b.is_ascii_graphic())
        && bytes[end..].iter().all(|&b| b == 0)
}

/// Pack a command name into a NUL-padded command field.
///
/// Returns `None` if the name is empty, too long, or not printable ASCII.
pub fn to_field(command: &str) -> Option<[u8; COMMAND_SIZE]> {
    let bytes = command.as_bytes();
    if bytes.is_empty() || bytes.len() > COMMAND_SIZE || !bytes.iter().all(u8::is_ascii_graphic) {
        return None;
    }
    let mut field = [0u8; COMMAND_SIZE];
    field[..bytes.len()].copy_from_slice(bytes);
    Some(field)
}
