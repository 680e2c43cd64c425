use std::time::Duration;

use peerwire_frame::{Ping, Pong};
use peerwire_peer::{InactivityMonitor, Proxy, Settings};
use peerwire_transport::{Acceptor, Socket};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_ping, OutputFormat, PingReceived};

pub async fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let idle_timeout = args
        .idle_timeout
        .as_deref()
        .map(parse_duration)
        .transpose()?;

    let acceptor = match args.bind {
        Some(address) => Acceptor::bind_addr(address).await,
        None => Acceptor::bind(args.port).await,
    }
    .map_err(|err| transport_error("bind failed", err))?;

    let local = acceptor.local_addr();
    let settings = args.network.settings(Some(local.port()))?;
    info!(
        address = %local,
        identifier = format_args!("{:#010x}", settings.identifier),
        "listening"
    );

    let (events, mut received) = mpsc::unbounded_channel();
    let mut printed = 0usize;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal.map_err(|err| {
                    CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
                })?;
                info!("interrupted");
                return Ok(SUCCESS);
            }
            accepted = acceptor.accept() => match accepted {
                Ok(socket) => serve(socket, &settings, idle_timeout, events.clone()),
                Err(err) => return Err(transport_error("accept failed", err)),
            },
            Some(event) = received.recv() => {
                print_ping(&event, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    return Ok(SUCCESS);
                }
            }
        }
    }
}

/// Run a channel for one accepted peer: answer each ping with a pong and
/// report it.
fn serve(
    socket: Socket,
    settings: &Settings,
    idle_timeout: Option<Duration>,
    events: mpsc::UnboundedSender<PingReceived>,
) {
    let monitor = idle_timeout.map(InactivityMonitor::new);
    let proxy = match &monitor {
        Some(monitor) => Proxy::with_hooks(socket, settings, monitor.clone()),
        None => Proxy::new(socket, settings),
    };
    let authority = proxy.authority();
    debug!(authority = %authority, "peer connected");

    let responder = proxy.clone();
    proxy.subscribe::<Ping, _>(move |result| {
        let Ok(ping) = result else {
            return false;
        };
        if let Some(nonce) = ping.nonce {
            responder.send(&Pong { nonce }, move |result| {
                if let Err(err) = result {
                    debug!(authority = %authority, error = %err, "pong not sent");
                }
            });
        }
        let event = PingReceived::new(
            authority.to_string(),
            ping.nonce,
            responder.negotiated_version(),
        );
        events.send(event).is_ok()
    });

    proxy.subscribe_stop(move |err| {
        debug!(authority = %authority, error = %err, "peer disconnected");
    });

    proxy.start(|result| {
        if let Err(err) = result {
            warn!(authority = %authority, error = %err, "channel failed to start");
        }
    });

    if let Some(monitor) = monitor {
        monitor.watch(&proxy);
    }
}
