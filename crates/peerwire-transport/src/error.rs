use crate::authority::Authority;

/// Errors that can occur while establishing peer sockets.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind the listening address.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: std::net::SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to the specified peer.
    #[error("failed to connect to {authority}: {source}")]
    Connect {
        authority: Authority,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The text could not be parsed as a peer authority.
    #[error("invalid authority '{0}'")]
    InvalidAuthority(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
