use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use peerwire_transport::BoxedWriter;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Completion callback for one send.
pub type SendHandler = Box<dyn FnOnce(Result<()>) + Send>;

type FailureHandler = Box<dyn Fn(Error) + Send + Sync>;

struct Pending {
    command: String,
    frame: Bytes,
    handler: SendHandler,
}

struct State {
    writer: Option<BoxedWriter>,
    in_flight: bool,
    closed: bool,
    queue: VecDeque<Pending>,
}

struct Shared {
    state: Mutex<State>,
    token: CancellationToken,
    on_failure: FailureHandler,
    runtime: Option<Handle>,
}

/// Orders outbound frames so that at most one write is in flight.
///
/// An idle serializer spawns a task that owns the write half until the queue
/// drains. Tasks are spawned on the runtime current at construction, so sends
/// may come from any thread; without one every send fails with
/// [`Error::OperationFailed`]. A failed write calls the failure callback (the channel's stop)
/// before completing the send that failed. Sends still queued once the stop
/// token fires complete with [`Error::ChannelStopped`].
#[derive(Clone)]
pub struct WriteSerializer {
    shared: Arc<Shared>,
}

impl WriteSerializer {
    pub fn new<F>(writer: Option<BoxedWriter>, token: CancellationToken, on_failure: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    closed: writer.is_none(),
                    writer,
                    in_flight: false,
                    queue: VecDeque::new(),
                }),
                token,
                on_failure: Box::new(on_failure),
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    /// Queue `frame` for writing. `handler` always runs exactly once.
    pub fn send(&self, command: &str, frame: Bytes, handler: SendHandler) {
        let mut state = self.shared.state.lock();
        if state.closed || self.shared.token.is_cancelled() {
            drop(state);
            handler(Err(Error::ChannelStopped));
            return;
        }
        let Some(runtime) = self.shared.runtime.as_ref() else {
            drop(state);
            debug!(command, "send without a runtime");
            handler(Err(Error::OperationFailed));
            return;
        };

        state.queue.push_back(Pending {
            command: command.to_string(),
            frame,
            handler,
        });
        if state.in_flight {
            return;
        }

        let Some(writer) = state.writer.take() else {
            let pending = close(&mut state);
            drop(state);
            complete_stopped(pending);
            return;
        };
        state.in_flight = true;
        drop(state);

        runtime.spawn(drain(Arc::clone(&self.shared), writer));
    }

    /// Refuse further sends and release the write half if idle.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        if !state.in_flight {
            let writer = state.writer.take();
            let pending = std::mem::take(&mut state.queue);
            drop(state);
            drop(writer);
            complete_stopped(pending);
        }
    }

    /// Sends waiting behind the current write.
    pub fn queued(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    pub fn in_flight(&self) -> bool {
        self.shared.state.lock().in_flight
    }
}

async fn drain(shared: Arc<Shared>, mut writer: BoxedWriter) {
    loop {
        let next = {
            let mut state = shared.state.lock();
            if state.closed || shared.token.is_cancelled() {
                let pending = close(&mut state);
                drop(state);
                drop(writer);
                complete_stopped(pending);
                return;
            }
            match state.queue.pop_front() {
                Some(next) => next,
                None => {
                    state.in_flight = false;
                    state.writer = Some(writer);
                    return;
                }
            }
        };

        let Pending {
            command,
            frame,
            handler,
        } = next;

        let result = tokio::select! {
            biased;
            _ = shared.token.cancelled() => Err(Error::ChannelStopped),
            written = write_frame(&mut writer, &frame) => written.map_err(Error::from),
        };

        match result {
            Ok(()) => {
                trace!(command = %command, size = frame.len(), "sent");
                handler(Ok(()));
            }
            Err(Error::ChannelStopped) => handler(Err(Error::ChannelStopped)),
            Err(err) => {
                debug!(command = %command, error = %err, "send failure");
                (shared.on_failure)(err.clone());
                handler(Err(err));
            }
        }
    }
}

async fn write_frame(writer: &mut BoxedWriter, frame: &[u8]) -> std::io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await
}

fn close(state: &mut State) -> VecDeque<Pending> {
    state.closed = true;
    state.in_flight = false;
    state.writer = None;
    std::mem::take(&mut state.queue)
}

fn complete_stopped(pending: VecDeque<Pending>) {
    for Pending { handler, .. } in pending {
        handler(Err(Error::ChannelStopped));
    }
}
