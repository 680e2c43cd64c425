use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A ping received by `listen`.
#[derive(Debug, Serialize)]
pub struct PingReceived {
    pub authority: String,
    pub nonce: Option<u64>,
    pub version: u32,
    pub timestamp: u64,
}

impl PingReceived {
    pub fn new(authority: String, nonce: Option<u64>, version: u32) -> Self {
        Self {
            authority,
            nonce,
            version,
            timestamp: now_unix_seconds(),
        }
    }
}

/// A completed `ping` exchange.
#[derive(Debug, Serialize)]
pub struct RoundTrip {
    pub authority: String,
    pub nonce: u64,
    pub rtt_ms: f64,
}

pub fn print_ping(event: &PingReceived, format: OutputFormat) {
    let nonce = event
        .nonce
        .map(|nonce| format!("{nonce:#018x}"))
        .unwrap_or_else(|| "-".to_string());

    match format {
        OutputFormat::Json => print_json(event),
        OutputFormat::Table => print_table(
            &["PEER", "NONCE", "VERSION"],
            vec![event.authority.clone(), nonce, event.version.to_string()],
        ),
        OutputFormat::Pretty => {
            println!(
                "ping from {} nonce={} version={}",
                event.authority, nonce, event.version
            );
        }
    }
}

pub fn print_round_trip(report: &RoundTrip, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => print_table(
            &["PEER", "NONCE", "RTT (ms)"],
            vec![
                report.authority.clone(),
                format!("{:#018x}", report.nonce),
                format!("{:.2}", report.rtt_ms),
            ],
        ),
        OutputFormat::Pretty => {
            println!(
                "pong from {} nonce={:#018x} time={:.2} ms",
                report.authority, report.nonce, report.rtt_ms
            );
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(header: &[&str], row: Vec<String>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec())
        .add_row(row);
    println!("{table}");
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
