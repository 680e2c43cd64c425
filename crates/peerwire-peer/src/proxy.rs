use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use bytes::BytesMut;
use peerwire_frame::{
    checksum, encode_message, ByteReader, FeeFilter, Heading, Message, Ping, Pong, SendHeaders,
    Verack, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use peerwire_transport::{Authority, BoxedReader, Socket};
use tokio::io::AsyncReadExt;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::dispatch::WriteSerializer;
use crate::error::{Error, Result};
use crate::registry::MessageRegistry;
use crate::settings::Settings;
use crate::stop::StopRegistry;

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Payload bytes kept ready before the first message arrives.
const INITIAL_PAYLOAD_CAPACITY: usize = 8 * 1024;

/// Longest prefix of an unparseable payload logged in verbose mode.
const MAX_PAYLOAD_DUMP: usize = 1024;

/// Extension points invoked by a running channel.
///
/// Both run on the channel's own tasks and must not block.
pub trait ProxyHooks: Send + Sync + 'static {
    /// A message was read, validated and dispatched.
    fn handle_activity(&self) {}

    /// The channel is stopping; subscribers have already been notified.
    fn handle_stopping(&self) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl ProxyHooks for NoHooks {}

/// A framed, typed channel to one peer.
///
/// `Proxy` is a cheap handle; clones share the channel. A channel reads one
/// heading and payload at a time, dispatches parsed messages to subscribers,
/// serializes outbound frames, and funnels every fatal condition through
/// [`Proxy::stop`].
///
/// Build it inside a tokio runtime; its tasks run there, so the handle may
/// then be used from any thread.
#[derive(Clone)]
pub struct Proxy {
    inner: Arc<ProxyInner>,
}

struct ProxyInner {
    socket: Socket,
    settings: Settings,
    maximum_payload: usize,
    state: AtomicU8,
    version: AtomicU32,
    messages: MessageRegistry,
    stops: StopRegistry,
    writer: WriteSerializer,
    hooks: Box<dyn ProxyHooks>,
    runtime: Option<Handle>,
}

impl Proxy {
    pub fn new(socket: Socket, settings: &Settings) -> Self {
        Self::with_hooks(socket, settings, NoHooks)
    }

    pub fn with_hooks<H: ProxyHooks>(socket: Socket, settings: &Settings, hooks: H) -> Self {
        let settings = *settings;
        let inner = Arc::new_cyclic(|weak: &Weak<ProxyInner>| {
            let weak = weak.clone();
            let writer =
                WriteSerializer::new(socket.take_writer(), socket.stop_token(), move |err| {
                    if let Some(inner) = weak.upgrade() {
                        inner.stop(err);
                    }
                });

            let messages = MessageRegistry::new();
            messages.register::<Verack>();
            messages.register::<Ping>();
            messages.register::<Pong>();
            messages.register::<SendHeaders>();
            messages.register::<FeeFilter>();

            ProxyInner {
                maximum_payload: settings.maximum_payload_size(),
                version: AtomicU32::new(settings.protocol_maximum),
                state: AtomicU8::new(CREATED),
                stops: StopRegistry::new(),
                hooks: Box::new(hooks),
                runtime: Handle::try_current().ok(),
                socket,
                settings,
                messages,
                writer,
            }
        });
        Self { inner }
    }

    /// Begin reading. `handler` runs before the first read is issued, so
    /// subscriptions made inside it see every message.
    ///
    /// Fails with [`Error::OperationFailed`] unless the channel is new and
    /// was built within a runtime.
    pub fn start<F>(&self, handler: F)
    where
        F: FnOnce(Result<()>),
    {
        let inner = &self.inner;
        let Some(runtime) = inner.runtime.clone() else {
            warn!(authority = %inner.socket.authority(), "channel built outside a runtime");
            handler(Err(Error::OperationFailed));
            return;
        };
        if inner
            .state
            .compare_exchange(CREATED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            handler(Err(Error::OperationFailed));
            return;
        }

        inner.stops.start();
        inner.messages.start();

        let Some(reader) = inner.socket.take_reader() else {
            inner.stop(Error::ChannelStopped);
            handler(Err(Error::OperationFailed));
            return;
        };

        debug!(authority = %inner.socket.authority(), "channel started");
        handler(Ok(()));
        runtime.spawn(read_loop(self.clone(), reader));
    }

    /// Deliver every parsed `M` to `handler` until it returns `false`.
    ///
    /// After stop the handler is invoked once with [`Error::ChannelStopped`].
    pub fn subscribe<M, F>(&self, handler: F)
    where
        M: Message,
        F: FnMut(Result<Arc<M>>) -> bool + Send + 'static,
    {
        self.inner.messages.subscribe::<M, F>(handler);
    }

    /// Learn the terminal error exactly once.
    ///
    /// Subscribing after stop yields [`Error::ChannelStopped`] immediately.
    pub fn subscribe_stop<F>(&self, handler: F)
    where
        F: FnOnce(Error) + Send + 'static,
    {
        self.inner.stops.subscribe(handler, Error::ChannelStopped);
    }

    /// Serialize `message` at the negotiated version and send it.
    pub fn send<M, F>(&self, message: &M, handler: F)
    where
        M: Message,
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let mut payload = BytesMut::new();
        message.serialize(self.negotiated_version(), &mut payload);
        self.send_payload(M::command(), &payload, handler);
    }

    /// Frame an already serialized payload and send it.
    ///
    /// `handler` always runs, with [`Error::ChannelStopped`] if the channel
    /// stopped before the frame was written.
    pub fn send_payload<F>(&self, command: &str, payload: &[u8], handler: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let frame = match encode_message(self.inner.settings.identifier, command, payload) {
            Ok(frame) => frame,
            Err(err) => {
                handler(Err(err.into()));
                return;
            }
        };
        self.inner.writer.send(command, frame, Box::new(handler));
    }

    /// Stop the channel with `error`. Only the first call has any effect.
    pub fn stop(&self, error: Error) {
        self.inner.stop(error);
    }

    /// True unless the channel is running.
    pub fn stopped(&self) -> bool {
        self.inner.stopped()
    }

    pub fn authority(&self) -> Authority {
        self.inner.socket.authority()
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn negotiated_version(&self) -> u32 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Version used for every subsequent parse and send.
    pub fn set_negotiated_version(&self, version: u32) {
        self.inner.version.store(version, Ordering::Release);
    }

    /// Largest payload this channel accepts.
    pub fn maximum_payload_size(&self) -> usize {
        self.inner.maximum_payload
    }
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("authority", &self.authority())
            .field("stopped", &self.stopped())
            .field("version", &self.negotiated_version())
            .finish()
    }
}

impl ProxyInner {
    fn stopped(&self) -> bool {
        self.state.load(Ordering::Acquire) != RUNNING
    }

    fn stop(&self, error: Error) {
        if self.state.swap(STOPPED, Ordering::AcqRel) == STOPPED {
            return;
        }
        debug!(authority = %self.socket.authority(), error = %error, "channel stopping");

        self.messages.stop();
        self.messages.broadcast(Error::ChannelStopped);

        self.stops.stop();
        self.stops.relay(error);

        self.hooks.handle_stopping();
        self.writer.stop();
        self.socket.stop();
    }

    async fn read_message(
        &self,
        reader: &mut BoxedReader,
        token: &CancellationToken,
        heading: &mut [u8; HEADER_SIZE],
        payload: &mut Vec<u8>,
    ) -> Result<()> {
        let authority = self.socket.authority();

        if let Err(err) = read_exact(reader, token, heading).await {
            if !self.stopped() {
                debug!(authority = %authority, error = %err, "heading read failure");
            }
            return Err(err);
        }
        if self.stopped() {
            return Err(Error::ChannelStopped);
        }

        let head = Heading::decode(&heading[..]).map_err(|err| {
            warn!(authority = %authority, error = %err, "undecodable heading");
            Error::BadStream
        })?;
        if !head.is_valid() {
            warn!(authority = %authority, "invalid heading");
            return Err(Error::BadStream);
        }

        let command = head.command();
        if head.magic != self.settings.identifier {
            debug!(
                authority = %authority,
                magic = format_args!("{:#010x}", head.magic),
                command,
                "invalid heading magic"
            );
            return Err(Error::BadStream);
        }

        let size = head.payload_size();
        if size > MAX_PAYLOAD_SIZE {
            debug!(authority = %authority, command, size, "huge payload indicated");
        }
        if size > self.maximum_payload {
            debug!(
                authority = %authority,
                command,
                size,
                maximum = self.maximum_payload,
                "oversized payload indicated"
            );
            return Err(Error::BadStream);
        }

        payload.resize(size, 0);
        if let Err(err) = read_exact(reader, token, payload).await {
            if !self.stopped() {
                debug!(authority = %authority, command, error = %err, "payload read failure");
            }
            return Err(err);
        }
        if self.stopped() {
            return Err(Error::ChannelStopped);
        }

        if self.settings.validate_checksum && checksum(payload.as_slice()) != head.checksum {
            warn!(authority = %authority, command, "invalid payload checksum");
            return Err(Error::BadStream);
        }

        let mut cursor = ByteReader::new(payload.as_slice());
        let version = self.version.load(Ordering::Acquire);
        if let Err(err) = self.messages.load(head.message_type(), version, &mut cursor) {
            if self.settings.verbose {
                let dump = &payload[..size.min(MAX_PAYLOAD_DUMP)];
                trace!(
                    authority = %authority,
                    command,
                    payload = %hex::encode(dump),
                    "invalid payload dump"
                );
            }
            trace!(authority = %authority, command, error = %err, "invalid payload");
            return Err(err.into());
        }

        if !cursor.is_exhausted() {
            trace!(
                authority = %authority,
                command,
                trailing = cursor.remaining(),
                "invalid payload, trailing bytes"
            );
            return Err(Error::BadStream);
        }

        debug!(authority = %authority, command, size, "received");
        self.hooks.handle_activity();
        Ok(())
    }
}

impl Drop for ProxyInner {
    fn drop(&mut self) {
        self.stop(Error::ChannelStopped);
    }
}

async fn read_loop(proxy: Proxy, mut reader: BoxedReader) {
    let token = proxy.inner.socket.stop_token();
    let mut heading = [0u8; HEADER_SIZE];
    let mut payload = Vec::with_capacity(INITIAL_PAYLOAD_CAPACITY);

    loop {
        let read = proxy
            .inner
            .read_message(&mut reader, &token, &mut heading, &mut payload)
            .await;
        if let Err(err) = read {
            proxy.stop(err);
            break;
        }
    }
}

async fn read_exact(
    reader: &mut BoxedReader,
    token: &CancellationToken,
    buf: &mut [u8],
) -> Result<()> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::ChannelStopped),
        read = reader.read_exact(buf) => read.map(|_| ()).map_err(Error::from),
    }
}
