//! Receiver configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use framecast_core::pipeline::DEFAULT_MAX_FRAME_BYTES;
use framecast_core::{Compression, ListenConfig, ReceiverConfig, TransportKind};

/// Top-level configuration for the receiver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverFileConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Display settings.
    pub display: DisplayConfig,
    /// Payload decoding.
    pub decoding: DecodingConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Interface address to bind.
    pub bind_host: String,
    /// Port to listen on.
    pub port: u16,
    /// "tcp" or "udp".
    pub transport: TransportKind,
    /// Drop a session after this much silence; 0 disables (TCP only,
    /// UDP falls back to 10 s).
    pub inactivity_timeout_ms: u64,
    /// Bind attempts before giving up.
    pub bind_attempts: u32,
    /// Delay between bind attempts in milliseconds.
    pub bind_retry_ms: u64,
    /// Largest accepted frame.
    pub max_frame_bytes: u64,
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Panel width in pixels.
    pub width: u32,
    /// Panel height in pixels.
    pub height: u32,
    /// Backlight level while running, 0-100.
    pub backlight: u8,
    /// Placeholder redraw cadence while waiting.
    pub placeholder_refresh_ms: u64,
    /// Where the snapshot display writes the current image.
    pub snapshot_path: PathBuf,
    /// Network identity shown on the placeholder (e.g. "wlan0 192.168.1.20").
    pub network_label: String,
}

/// Payload decoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingConfig {
    /// "none" or "zstd". Must match the sender.
    pub compression: Compression,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            port: 5000,
            transport: TransportKind::Tcp,
            inactivity_timeout_ms: 0,
            bind_attempts: 3,
            bind_retry_ms: 1000,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 240,
            backlight: 100,
            placeholder_refresh_ms: 2000,
            snapshot_path: PathBuf::from("framecast-display.png"),
            network_label: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ReceiverFileConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default configuration to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Socket address to bind. An unparsable host binds all interfaces.
    pub fn bind_addr(&self) -> SocketAddr {
        let ip = self.network.bind_host.parse::<IpAddr>().unwrap_or_else(|_| {
            tracing::warn!(
                "bind_host '{}' is not an IP address; binding 0.0.0.0",
                self.network.bind_host
            );
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });
        SocketAddr::new(ip, self.network.port)
    }

    pub fn to_listen_config(&self) -> ListenConfig {
        ListenConfig {
            bind: self.bind_addr(),
            transport: self.network.transport,
            bind_attempts: self.network.bind_attempts.max(1),
            bind_retry_delay: Duration::from_millis(self.network.bind_retry_ms),
            placeholder_refresh: Duration::from_millis(self.display.placeholder_refresh_ms.max(100)),
        }
    }

    pub fn to_receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig {
            compression: self.decoding.compression,
            inactivity_timeout: (self.network.inactivity_timeout_ms > 0)
                .then(|| Duration::from_millis(self.network.inactivity_timeout_ms)),
            max_frame_bytes: self.network.max_frame_bytes,
            backlight: self.display.backlight.min(100),
            ..ReceiverConfig::default()
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
