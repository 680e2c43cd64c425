use std::time::Instant;

use peerwire_frame::{Ping, Pong};
use peerwire_peer::{Error, Proxy};
use peerwire_transport::{connect, Authority};
use tokio::sync::mpsc;
use tracing::debug;

use crate::cmd::{parse_duration, PingArgs};
use crate::exit::{peer_error, transport_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_round_trip, OutputFormat, RoundTrip};

pub async fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    let authority: Authority = args
        .authority
        .parse()
        .map_err(|err| transport_error("invalid peer address", err))?;
    let timeout = parse_duration(&args.timeout)?;
    let settings = args.network.settings(None)?;

    let socket = tokio::time::timeout(timeout, connect(&authority))
        .await
        .map_err(|_| CliError::new(TIMEOUT, format!("connect timed out after {timeout:?}")))?
        .map_err(|err| transport_error("connect failed", err))?;

    let proxy = Proxy::new(socket, &settings);
    let nonce: u64 = rand::random();
    let (outcome, mut done) = mpsc::unbounded_channel::<Result<(), Error>>();

    let on_pong = outcome.clone();
    proxy.subscribe::<Pong, _>(move |result| match result {
        Ok(pong) if pong.nonce == nonce => {
            let _ = on_pong.send(Ok(()));
            false
        }
        Ok(pong) => {
            debug!(expected = nonce, received = pong.nonce, "ignoring unmatched pong");
            true
        }
        // The stop subscription carries the real cause.
        Err(_) => false,
    });

    let on_stop = outcome.clone();
    proxy.subscribe_stop(move |err| {
        let _ = on_stop.send(Err(err));
    });

    let mut started = Ok(());
    proxy.start(|result| started = result);
    started.map_err(|err| peer_error("start failed", err))?;

    let sent_at = Instant::now();
    let on_send = outcome;
    proxy.send(&Ping::new(nonce), move |result| {
        if let Err(err) = result {
            let _ = on_send.send(Err(err));
        }
    });

    let outcome = tokio::time::timeout(timeout, done.recv()).await;
    let rtt = sent_at.elapsed();

    match outcome {
        Ok(Some(Ok(()))) => {
            proxy.stop(Error::ChannelStopped);
            let report = RoundTrip {
                authority: authority.to_string(),
                nonce,
                rtt_ms: (rtt.as_secs_f64() * 1000.0 * 100.0).round() / 100.0,
            };
            print_round_trip(&report, format);
            Ok(SUCCESS)
        }
        Ok(Some(Err(err))) => Err(peer_error("ping failed", err)),
        Ok(None) => Err(peer_error("ping failed", Error::ChannelStopped)),
        Err(_) => {
            proxy.stop(Error::ChannelTimeout);
            Err(peer_error(
                &format!("no pong within {timeout:?}"),
                Error::ChannelTimeout,
            ))
        }
    }
}
