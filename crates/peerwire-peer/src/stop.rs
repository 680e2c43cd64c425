use parking_lot::Mutex;

use crate::error::Error;

type StopHandler = Box<dyn FnOnce(Error) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Started,
    Stopped,
}

/// One-shot delivery of a channel's terminal error.
///
/// Each handler runs exactly once: with the relayed error if it subscribed in
/// time, or immediately with the caller's "too late" code if it subscribed
/// after [`StopRegistry::stop`]. No handler is ever dropped unnotified.
pub struct StopRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    phase: Phase,
    handlers: Vec<StopHandler>,
}

impl StopRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: Phase::Idle,
                handlers: Vec::new(),
            }),
        }
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

    /// Register `handler`, or invoke it with `stopped` if the registry is closed.
    pub fn subscribe<F>(&self, handler: F, stopped: Error)
    where
        F: FnOnce(Error) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.phase == Phase::Stopped {
            drop(inner);
            handler(stopped);
            return;
        }
        inner.handlers.push(Box::new(handler));
    }

    /// Close to new subscriptions. Returns true for the call that closed it.
    pub fn stop(&self) -> bool {
        let mut inner = self.inner.lock();
        let first = inner.phase != Phase::Stopped;
        inner.phase = Phase::Stopped;
        first
    }

    /// Invoke every registered handler once with `error`, then forget them.
    pub fn relay(&self, error: Error) {
        let handlers = std::mem::take(&mut self.inner.lock().handlers);
        for handler in handlers {
            handler(error.clone());
        }
    }

    pub fn stopped(&self) -> bool {
        self.inner.lock().phase == Phase::Stopped
    }

    /// Number of handlers awaiting the terminal error.
    pub fn len(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StopRegistry {
    fn default() -> Self {
        Self::new()
    }
}
