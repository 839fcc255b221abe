//! framecast receiver: entry point.
//!
//! ```text
//! framecast-receiver                    Listen using framecast-receiver.toml
//! framecast-receiver --config <path>    Use custom config TOML
//! framecast-receiver --port <p>         Override the listening port
//! framecast-receiver --gen-config       Dump default config and exit
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use framecast_core::{Receiver, ReceiverSupervisor, TransportKind};
use framecast_receiver::config::ReceiverFileConfig;
use framecast_receiver::display::SnapshotDisplay;
use framecast_receiver::status::SystemStatus;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "framecast-receiver", about = "Show frames streamed by a framecast sender")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "framecast-receiver.toml")]
    config: PathBuf,

    /// Listening port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Transport: tcp or udp (overrides config).
    #[arg(short, long)]
    transport: Option<TransportKind>,

    /// Snapshot file the display writes to (overrides config).
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ReceiverFileConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = ReceiverFileConfig::load(&cli.config);
    if let Some(port) = cli.port {
        config.network.port = port;
    }
    if let Some(transport) = cli.transport {
        config.network.transport = transport;
    }
    if let Some(path) = cli.snapshot {
        config.display.snapshot_path = path;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("framecast-receiver v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "display: {}x{} -> {}",
        config.display.width,
        config.display.height,
        config.display.snapshot_path.display()
    );

    let display = SnapshotDisplay::new(
        config.display.snapshot_path.clone(),
        config.display.width,
        config.display.height,
    );
    let status = SystemStatus::new(
        config.display.network_label.clone(),
        config.network.transport,
        config.network.port,
    );
    let receiver = Receiver::new(display, status, config.to_receiver_config());

    // A bind failure is the only error that ends the process.
    let supervisor = match ReceiverSupervisor::bind(receiver, config.to_listen_config()).await {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            return Err(e.into());
        }
    };

    // Ctrl-C handler.
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.cancel();
    });

    let stats = supervisor.run(cancel).await;
    info!(
        "done: {} sessions, {} frames presented, {} dropped, {} keep-alives, {} resyncs",
        stats.sessions,
        stats.frames_presented,
        stats.frames_dropped,
        stats.keepalives,
        stats.resyncs
    );

    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_flag_parses_via_core() {
        let cli = Cli::try_parse_from(["framecast-receiver", "-t", "tcp"]).unwrap();
        assert_eq!(cli.transport, Some(TransportKind::Tcp));
        assert!(Cli::try_parse_from(["framecast-receiver", "--transport", "quic"]).is_err());
    }
}
