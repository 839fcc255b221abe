//! framecast sender: entry point.
//!
//! ```text
//! framecast-sender                      Stream using framecast-sender.toml
//! framecast-sender --config <path>      Load a custom config TOML
//! framecast-sender --host <h> --port <p> Override the receiver address
//! framecast-sender --gen-config         Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use framecast_core::{Connector, SenderPump, SenderSupervisor, TcpConnector, TransportKind, UdpConnector};
use framecast_sender::config::SenderFileConfig;
use framecast_sender::source::Source;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "framecast-sender", about = "Stream a screen region to a framecast receiver")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "framecast-sender.toml")]
    config: PathBuf,

    /// Receiver host (overrides the config file).
    #[arg(long)]
    host: Option<String>,

    /// Receiver port (overrides the config file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Transport: tcp or udp (overrides the config file).
    #[arg(short, long)]
    transport: Option<TransportKind>,

    /// Capture source: "pattern" or an image path (overrides the config file).
    #[arg(short, long)]
    source: Option<String>,

    /// Frames per second (overrides the config file).
    #[arg(long)]
    fps: Option<f64>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&SenderFileConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config, then apply CLI overrides.
    let mut config = SenderFileConfig::load(&cli.config);
    if let Some(host) = cli.host {
        config.network.host = host;
    }
    if let Some(port) = cli.port {
        config.network.port = port;
    }
    if let Some(transport) = cli.transport {
        config.network.transport = transport;
    }
    if let Some(source) = cli.source {
        config.capture.source = source;
    }
    if let Some(fps) = cli.fps {
        config.capture.fps = fps;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let source = Source::from_setting(&config.capture.source)?;
    let pump_config = config.to_sender_config();

    info!("framecast-sender v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "target: {}://{}:{}",
        config.network.transport, config.network.host, config.network.port
    );
    info!("source: {}", source.describe());
    info!(
        "region: {:?} at {} fps, {:?} q{} ({:?})",
        pump_config.region,
        config.capture.fps,
        pump_config.encoder.format,
        pump_config.encoder.quality,
        pump_config.encoder.compression
    );

    let connector: Box<dyn Connector> = match config.network.transport {
        TransportKind::Tcp => Box::new(TcpConnector::new(
            config.network.host.clone(),
            config.network.port,
            config.connect_timeout(),
        )),
        TransportKind::Udp => Box::new(UdpConnector::new(
            config.network.host.clone(),
            config.network.port,
        )),
    };

    let pump = SenderPump::new(source, pump_config);
    let mut supervisor = SenderSupervisor::new(connector, pump).with_backoff(config.backoff());

    // Ctrl-C handler.
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.cancel();
    });

    let stats = supervisor.run(&cancel).await;
    info!(
        "done: {} attempts, {} sessions, {} frames sent",
        stats.attempts,
        stats.sessions,
        supervisor.pump().stats().frames_sent
    );

    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_flag_parses_via_core() {
        let cli = Cli::try_parse_from(["framecast-sender", "--transport", "UDP"]).unwrap();
        assert_eq!(cli.transport, Some(TransportKind::Udp));
        assert!(Cli::try_parse_from(["framecast-sender", "-t", "serial"]).is_err());
    }
}
