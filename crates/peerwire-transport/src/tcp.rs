use std::net::{Ipv6Addr, SocketAddr};

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::authority::Authority;
use crate::error::{Result, TransportError};
use crate::socket::Socket;

/// TCP listener producing peer sockets.
#[derive(Debug)]
pub struct Acceptor {
    listener: TcpListener,
    local: SocketAddr,
}

impl Acceptor {
    /// Listen on all interfaces at `port` (dual-stack where supported).
    ///
    /// Port 0 binds an ephemeral port; see [`Acceptor::local_addr`].
    pub async fn bind(port: u16) -> Result<Self> {
        let any_v6 = SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), port);
        match Self::bind_addr(any_v6).await {
            Ok(acceptor) => Ok(acceptor),
            Err(err) => {
                debug!(error = %err, "ipv6 bind failed, falling back to ipv4");
                Self::bind_addr(SocketAddr::from(([0, 0, 0, 0], port))).await
            }
        }
    }

    /// Listen on an explicit address.
    pub async fn bind_addr(address: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| TransportError::Bind { address, source })?;
        let local = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { address, source })?;

        info!(%local, "listening for peers");
        Ok(Self { listener, local })
    }

    /// Accept the next incoming connection.
    pub async fn accept(&self) -> Result<Socket> {
        let (stream, remote) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;
        configure(&stream)?;

        let authority = Authority::from(remote);
        debug!(%authority, "accepted connection");
        Ok(Socket::new(stream, authority))
    }

    /// Bound local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }
}

/// Connect to a listening peer.
pub async fn connect(authority: &Authority) -> Result<Socket> {
    let stream = TcpStream::connect(authority.to_socket_addr())
        .await
        .map_err(|source| TransportError::Connect {
            authority: *authority,
            source,
        })?;
    configure(&stream)?;

    debug!(%authority, "connected");
    Ok(Socket::new(stream, *authority))
}

fn configure(stream: &TcpStream) -> Result<()> {
    stream.set_nodelay(true)?;
    Ok(())
}
