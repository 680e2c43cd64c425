use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;

use crate::authority::Authority;

/// Read half of a socket stream.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Write half of a socket stream.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A connected peer stream that can be stopped exactly once.
///
/// The stream is split at construction. The channel that owns the socket takes
/// each half once; pending reads and writes race against [`Socket::cancelled`]
/// so that [`Socket::stop`] interrupts them. Dropping both halves closes the
/// underlying connection.
pub struct Socket {
    authority: Authority,
    reader: Mutex<Option<BoxedReader>>,
    writer: Mutex<Option<BoxedWriter>>,
    token: CancellationToken,
}

impl Socket {
    /// Wrap any bidirectional byte stream.
    pub fn new<S>(stream: S, authority: Authority) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            authority,
            reader: Mutex::new(Some(Box::new(reader))),
            writer: Mutex::new(Some(Box::new(writer))),
            token: CancellationToken::new(),
        }
    }

    /// Address of the remote peer.
    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Take the read half. Returns `None` once taken.
    pub fn take_reader(&self) -> Option<BoxedReader> {
        self.reader.lock().take()
    }

    /// Take the write half. Returns `None` once taken.
    pub fn take_writer(&self) -> Option<BoxedWriter> {
        self.writer.lock().take()
    }

    /// Cancel all pending and future I/O. Idempotent.
    pub fn stop(&self) {
        if self.token.is_cancelled() {
            return;
        }
        self.token.cancel();

        // Halves never handed out are released here; handed-out halves are
        // dropped by their owners once they observe cancellation.
        drop(self.reader.lock().take());
        drop(self.writer.lock().take());
        debug!(authority = %self.authority, "socket stopped");
    }

    /// True once [`Socket::stop`] has been called.
    pub fn stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the socket is stopped.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// A token observing this socket's stop signal, for use in spawned tasks.
    pub fn stop_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("authority", &self.authority)
            .field("stopped", &self.stopped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn authority() -> Authority {
        "127.0.0.1:8333".parse().unwrap()
    }

    #[tokio::test]
    async fn halves_are_taken_once() {
        let (_client, server) = tokio::io::duplex(64);
        let socket = Socket::new(server, authority());

        assert!(socket.take_reader().is_some());
        assert!(socket.take_reader().is_none());
        assert!(socket.take_writer().is_some());
        assert!(socket.take_writer().is_none());
    }

    #[tokio::test]
    async fn halves_carry_bytes_both_ways() {
        let (mut client, server) = tokio::io::duplex(64);
        let socket = Socket::new(server, authority());
        let mut reader = socket.take_reader().unwrap();
        let mut writer = socket.take_writer().unwrap();

        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        writer.write_all(b"pong").await.unwrap();
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_releases_halves() {
        let (mut client, server) = tokio::io::duplex(64);
        let socket = Socket::new(server, authority());

        assert!(!socket.stopped());
        socket.stop();
        socket.stop();
        assert!(socket.stopped());
        assert!(socket.take_reader().is_none());
        assert!(socket.take_writer().is_none());

        // Both halves dropped: the peer observes end of stream.
        let mut buf = [0u8; 1];
        let read = client.read(&mut buf).await.unwrap();
        assert_eq!(read, 0);
    }

    #[tokio::test]
    async fn cancelled_completes_after_stop() {
        let (_client, server) = tokio::io::duplex(64);
        let socket = Socket::new(server, authority());
        let token = socket.stop_token();

        socket.stop();
        socket.cancelled().await;
        assert!(token.is_cancelled());
    }
}
