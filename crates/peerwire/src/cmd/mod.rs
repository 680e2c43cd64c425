use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use peerwire_frame::network::{
    MAINNET_IDENTIFIER, REGTEST_IDENTIFIER, SCALENET_IDENTIFIER, TESTNET4_IDENTIFIER,
    TESTNET_IDENTIFIER,
};
use peerwire_peer::Settings;

use crate::exit::{CliError, CliResult, DATA_INVALID, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod ping;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept peers, answer pings and print them.
    Listen(ListenArgs),
    /// Ping a peer and print the round trip.
    Ping(PingArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format).await,
        Command::Ping(args) => ping::run(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

/// Channel settings shared by commands that open peer connections.
#[derive(Args, Debug, Default)]
pub struct NetworkArgs {
    /// JSON settings file; flags override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Network magic: mainnet, testnet, testnet4 (or chipnet), scalenet, regtest, or a number.
    #[arg(long, value_name = "MAGIC")]
    pub identifier: Option<String>,
    /// Highest protocol version to speak.
    #[arg(long, value_name = "VERSION")]
    pub protocol_maximum: Option<u32>,
    /// Reject payloads whose checksum does not match the heading.
    #[arg(long)]
    pub validate_checksum: bool,
    /// Log a hex dump of payloads that fail to parse (trace level).
    #[arg(long)]
    pub verbose_payloads: bool,
}

impl NetworkArgs {
    /// Resolve settings: defaults, then the config file, then flags.
    pub fn settings(&self, inbound_port: Option<u16>) -> CliResult<Settings> {
        let mut settings = match &self.config {
            Some(path) => load_settings(path)?,
            None => Settings::default(),
        };

        if let Some(identifier) = &self.identifier {
            settings.identifier = parse_identifier(identifier)?;
        }
        if let Some(version) = self.protocol_maximum {
            settings.protocol_maximum = version;
        }
        if let Some(port) = inbound_port {
            settings.inbound_port = port;
        }
        settings.validate_checksum |= self.validate_checksum;
        settings.verbose |= self.verbose_payloads;
        Ok(settings)
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Port to accept peers on (all interfaces).
    #[arg(long, short = 'p', default_value = "8333")]
    pub port: u16,
    /// Bind to this address instead of all interfaces.
    #[arg(long, value_name = "ADDR", conflicts_with = "port")]
    pub bind: Option<SocketAddr>,
    /// Exit after printing N pings.
    #[arg(long)]
    pub count: Option<usize>,
    /// Drop peers silent for this long (e.g. 90s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub idle_timeout: Option<String>,
    #[command(flatten)]
    pub network: NetworkArgs,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Peer address (host:port or [v6]:port).
    pub authority: String,
    /// Maximum time to wait for the pong (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    #[command(flatten)]
    pub network: NetworkArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn load_settings(path: &std::path::Path) -> CliResult<Settings> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        crate::exit::io_error(&format!("reading {}", path.display()), &err)
    })?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("invalid settings in {}: {err}", path.display()),
        )
    })
}

pub fn parse_identifier(input: &str) -> CliResult<u32> {
    let input = input.trim();
    let named = match input.to_ascii_lowercase().as_str() {
        "mainnet" => Some(MAINNET_IDENTIFIER),
        "testnet" => Some(TESTNET_IDENTIFIER),
        "testnet4" | "chipnet" => Some(TESTNET4_IDENTIFIER),
        "scalenet" => Some(SCALENET_IDENTIFIER),
        "regtest" => Some(REGTEST_IDENTIFIER),
        _ => None,
    };
    if let Some(identifier) = named {
        return Ok(identifier);
    }

    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| CliError::new(USAGE, format!("invalid network identifier: {input}")))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
