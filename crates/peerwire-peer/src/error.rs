use std::sync::Arc;

use peerwire_frame::CodecError;

/// Terminal and operational outcomes of a peer channel.
///
/// There is no success variant: anything that reports an `Error` failed, and
/// [`crate::Proxy::stop`] can only be given a real failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The operation is not legal in the channel's current state.
    #[error("operation failed")]
    OperationFailed,

    /// The channel stopped before the operation could complete.
    #[error("channel stopped")]
    ChannelStopped,

    /// An external deadline for the channel expired.
    #[error("channel timed out")]
    ChannelTimeout,

    /// No traffic was seen within the inactivity window.
    #[error("channel inactive")]
    ChannelInactive,

    /// The peer violated framing: bad heading, wrong magic, oversized or
    /// corrupt payload, or trailing bytes.
    #[error("bad data stream")]
    BadStream,

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// A known message failed to parse or serialize.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_shareable() {
        let err = Error::from(std::io::Error::from(std::io::ErrorKind::ConnectionReset));
        let copy = err.clone();
        assert!(matches!(copy, Error::Io(inner) if inner.kind() == std::io::ErrorKind::ConnectionReset));
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn codec_errors_convert() {
        let err: Error = CodecError::Truncated {
            needed: 8,
            remaining: 0,
        }
        .into();
        assert!(matches!(err, Error::Codec(CodecError::Truncated { .. })));
    }
}
