use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use peerwire_frame::{ByteReader, CodecError, Message, MessageType};
use tracing::warn;

use crate::error::Error;
use crate::stop::Phase;

type Parsed = Arc<dyn Any + Send + Sync>;
type ParseFn = dyn Fn(u32, &mut ByteReader<'_>) -> Result<Parsed, CodecError> + Send + Sync;
type Handler = Box<dyn FnMut(Result<&Parsed, &Error>) -> bool + Send>;

struct Parser {
    type_id: TypeId,
    name: &'static str,
    parse: Arc<ParseFn>,
}

impl Parser {
    fn of<M: Message>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: std::any::type_name::<M>(),
            parse: Arc::new(|version: u32, reader: &mut ByteReader<'_>| {
                M::parse(version, reader).map(|message| Arc::new(message) as Parsed)
            }),
        }
    }
}

/// Message-type keyed parsers and the handlers interested in each type.
///
/// Handlers return `true` to stay subscribed for the next message and `false`
/// to unsubscribe. They run without any registry lock held, so a handler may
/// subscribe further handlers or stop the owning channel.
pub struct MessageRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    phase: Phase,
    parsers: HashMap<MessageType, Parser>,
    handlers: HashMap<MessageType, Vec<Handler>>,
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: Phase::Idle,
                parsers: HashMap::new(),
                handlers: HashMap::new(),
            }),
        }
    }

    /// Install the parser for `M`, replacing any parser registered for the
    /// same message type.
    pub fn register<M: Message>(&self) {
        self.inner.lock().parsers.insert(M::TYPE, Parser::of::<M>());
    }

    /// True if payloads of this type are parsed.
    pub fn is_registered(&self, message_type: MessageType) -> bool {
        self.inner.lock().parsers.contains_key(&message_type)
    }

    /// Add a handler for `M`, installing its parser if the type has none.
    ///
    /// After [`MessageRegistry::stop`] the handler is invoked immediately with
    /// [`Error::ChannelStopped`] instead. A handler for a type other than the
    /// one registered for `M::TYPE` is rejected with
    /// [`Error::OperationFailed`] and never stored.
    pub fn subscribe<M, F>(&self, mut handler: F)
    where
        M: Message,
        F: FnMut(Result<Arc<M>, Error>) -> bool + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.phase == Phase::Stopped {
            drop(inner);
            handler(Err(Error::ChannelStopped));
            return;
        }

        let parser = inner.parsers.entry(M::TYPE).or_insert_with(Parser::of::<M>);
        if parser.type_id != TypeId::of::<M>() {
            let registered = parser.name;
            drop(inner);
            warn!(
                command = M::command(),
                registered,
                requested = std::any::type_name::<M>(),
                "handler type differs from registered parser"
            );
            handler(Err(Error::OperationFailed));
            return;
        }

        let erased: Handler = Box::new(move |event: Result<&Parsed, &Error>| match event {
            Ok(parsed) => match Arc::clone(parsed).downcast::<M>() {
                Ok(message) => handler(Ok(message)),
                Err(_) => true,
            },
            Err(err) => handler(Err(err.clone())),
        });
        inner.handlers.entry(M::TYPE).or_default().push(erased);
    }

    /// Parse a payload of `message_type` and hand the result to its handlers.
    ///
    /// Types without a parser are skipped (forward compatibility) and return
    /// `Ok`. A parse failure is returned without notifying handlers. Parsing
    /// happens whether or not any handler is subscribed.
    pub fn load(
        &self,
        message_type: MessageType,
        version: u32,
        reader: &mut ByteReader<'_>,
    ) -> Result<(), CodecError> {
        let parse = match self.inner.lock().parsers.get(&message_type) {
            Some(parser) => Arc::clone(&parser.parse),
            None => return Ok(()),
        };

        let parsed = parse(version, reader)?;

        let mut current = self
            .inner
            .lock()
            .handlers
            .get_mut(&message_type)
            .map(std::mem::take)
            .unwrap_or_default();
        if current.is_empty() {
            return Ok(());
        }

        current.retain_mut(|handler| handler(Ok(&parsed)));

        let mut inner = self.inner.lock();
        if inner.phase == Phase::Stopped {
            // Stopped while dispatching: the broadcast could not see these.
            drop(inner);
            for mut handler in current {
                handler(Err(&Error::ChannelStopped));
            }
            return Ok(());
        }

        // Retained handlers keep their place ahead of any added meanwhile.
        let slot = inner.handlers.entry(message_type).or_default();
        let added = std::mem::replace(slot, current);
        slot.extend(added);
        Ok(())
    }

    /// Open for subscription. Returns false if already stopped.
    pub fn start(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::Stopped => false,
            _ => {
                inner.phase = Phase::Started;
                true
            }
        }
    }

    /// Close to new subscriptions. Returns true for the call that closed it.
    pub fn stop(&self) -> bool {
        let mut inner = self.inner.lock();
        let first = inner.phase != Phase::Stopped;
        inner.phase = Phase::Stopped;
        first
    }

    /// Deliver `error` to every subscribed handler and drop them all.
    pub fn broadcast(&self, error: Error) {
        let handlers = std::mem::take(&mut self.inner.lock().handlers);
        for (_, list) in handlers {
            for mut handler in list {
                handler(Err(&error));
            }
        }
    }

    pub fn stopped(&self) -> bool {
        self.inner.lock().phase == Phase::Stopped
    }

    /// Number of handlers subscribed to `message_type`.
    pub fn subscribers(&self, message_type: MessageType) -> usize {
        self.inner
            .lock()
            .handlers
            .get(&message_type)
            .map_or(0, Vec::len)
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
