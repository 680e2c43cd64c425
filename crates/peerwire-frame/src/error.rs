/// Errors that can occur while decoding headings or parsing message payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Fewer bytes were available than the structure requires.
    #[error("truncated input (needed {needed} bytes, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },

    /// The command name cannot be carried in a heading.
    #[error("invalid command name '{0}'")]
    InvalidCommand(String),

    /// The payload exceeds what a heading can describe.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The message is not defined at the negotiated protocol version.
    #[error("{command} requires protocol version {minimum} (negotiated {version})")]
    UnsupportedVersion {
        command: &'static str,
        version: u32,
        minimum: u32,
    },

    /// The payload decoded but holds a value the message forbids.
    #[error("invalid {command} payload: {reason}")]
    InvalidPayload {
        command: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, CodecError>;
