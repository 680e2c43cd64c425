use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;
use crate::proxy::{Proxy, ProxyHooks};

/// Stops a channel that goes quiet.
///
/// Install a clone as the channel's hooks so that every processed message
/// counts as activity, then [`InactivityMonitor::watch`] the channel. The
/// watch task ends when the channel stops for any reason.
#[derive(Clone)]
pub struct InactivityMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    timeout: Duration,
    last_activity: Mutex<Instant>,
    token: CancellationToken,
}

impl InactivityMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                timeout,
                last_activity: Mutex::new(Instant::now()),
                token: CancellationToken::new(),
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Time since the last message (or since the monitor was created).
    pub fn idle(&self) -> Duration {
        self.inner.last_activity.lock().elapsed()
    }

    /// Stop `proxy` with [`Error::ChannelInactive`] once no activity has been
    /// seen for the configured timeout. Must be called within a tokio runtime.
    pub fn watch(&self, proxy: &Proxy) -> JoinHandle<()> {
        let token = self.inner.token.clone();
        let released = token.clone();
        proxy.subscribe_stop(move |_| released.cancel());

        let inner = Arc::clone(&self.inner);
        let proxy = proxy.clone();
        tokio::spawn(async move {
            loop {
                let deadline = *inner.last_activity.lock() + inner.timeout;
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep_until(deadline) => {}
                }

                if inner.last_activity.lock().elapsed() >= inner.timeout {
                    debug!(
                        authority = %proxy.authority(),
                        timeout = ?inner.timeout,
                        "channel inactive"
                    );
                    proxy.stop(Error::ChannelInactive);
                    return;
                }
            }
        })
    }
}

impl ProxyHooks for InactivityMonitor {
    fn handle_activity(&self) {
        *self.inner.last_activity.lock() = Instant::now();
    }

    fn handle_stopping(&self) {
        self.inner.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use peerwire_frame::encode_message;
    use peerwire_frame::network::MAINNET_IDENTIFIER;
    use peerwire_transport::Socket;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::oneshot;

    use super::*;
    use crate::settings::Settings;

    fn monitored(timeout: Duration) -> (Proxy, InactivityMonitor, tokio::io::DuplexStream) {
        let (client, server) = tokio::io::duplex(1 << 12);
        let monitor = InactivityMonitor::new(timeout);
        let proxy = Proxy::with_hooks(
            Socket::new(server, "127.0.0.1:8333".parse().unwrap()),
            &Settings::default(),
            monitor.clone(),
        );
        (proxy, monitor, client)
    }

    fn watch_stop(proxy: &Proxy) -> oneshot::Receiver<Error> {
        let (tx, rx) = oneshot::channel();
        proxy.subscribe_stop(move |err| {
            let _ = tx.send(err);
        });
        rx
    }

    #[tokio::test]
    async fn silent_channel_is_stopped() {
        let (proxy, monitor, _client) = monitored(Duration::from_millis(50));
        let stop = watch_stop(&proxy);
        proxy.start(|result| assert!(result.is_ok()));
        let task = monitor.watch(&proxy);

        let err = tokio::time::timeout(Duration::from_secs(2), stop)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(err, Error::ChannelInactive));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn traffic_keeps_channel_alive() {
        let (proxy, monitor, mut client) = monitored(Duration::from_millis(200));
        proxy.start(|result| assert!(result.is_ok()));
        let _task = monitor.watch(&proxy);

        let verack = encode_message(MAINNET_IDENTIFIER, "verack", &[]).unwrap();
        for _ in 0..20 {
            client.write_all(&verack).await.unwrap();
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        assert!(!proxy.stopped());
        assert!(monitor.idle() < monitor.timeout());
    }

    #[tokio::test]
    async fn watch_ends_when_channel_stops() {
        let (proxy, monitor, _client) = monitored(Duration::from_secs(60));
        let stop = watch_stop(&proxy);
        proxy.start(|result| assert!(result.is_ok()));
        let task = monitor.watch(&proxy);

        proxy.stop(Error::ChannelTimeout);

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("watch task should end")
            .unwrap();
        assert!(matches!(stop.await.unwrap(), Error::ChannelTimeout));
    }
}
