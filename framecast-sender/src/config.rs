//! Configuration for the framecast sender.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use framecast_core::{
    Compression, EncoderConfig, ImageFormat, Region, Rotation, SenderConfig, TransportKind,
};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderFileConfig {
    /// Where the receiver lives.
    pub network: NetworkConfig,
    /// What to capture and how often.
    pub capture: CaptureConfig,
    /// How frames are put on the wire.
    pub encoding: EncodingConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Receiver hostname or address.
    pub host: String,
    /// Receiver port.
    pub port: u16,
    /// "tcp" or "udp".
    pub transport: TransportKind,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Fixed delay between a failure and the next attempt.
    pub backoff_ms: u64,
}

/// Capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// "pattern" for the built-in test pattern, otherwise a path to a
    /// still image used as the virtual screen.
    pub source: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Target frames per second.
    pub fps: f64,
}

/// Encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// "jpeg" or "png".
    pub format: ImageFormat,
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// "none" or "zstd". Must match the receiver.
    pub compression: Compression,
    /// Clockwise rotation in degrees: 0, 90, 180 or 270.
    pub rotation: u32,
    /// Resize target; 0 keeps the captured size.
    pub output_width: u32,
    pub output_height: u32,
    /// Skip frames whose payload equals the previous one.
    pub skip_unchanged: bool,
    /// Send a keep-alive after this much silence; 0 disables.
    pub keepalive_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            transport: TransportKind::Tcp,
            connect_timeout_ms: 3000,
            backoff_ms: 5000,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: "pattern".into(),
            left: 0,
            top: 0,
            width: 240,
            height: 240,
            fps: 10.0,
        }
    }
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::Jpeg,
            quality: 50,
            compression: Compression::None,
            rotation: 0,
            output_width: 0,
            output_height: 0,
            skip_unchanged: false,
            keepalive_ms: 2000,
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

impl SenderFileConfig {
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

    /// Write the default configuration to a file (for bootstrapping).
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network.connect_timeout_ms.max(1))
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.network.backoff_ms)
    }

    /// Convert capture and encoding settings into a pump configuration.
    pub fn to_sender_config(&self) -> SenderConfig {
        let enc = &self.encoding;
        let rotation = Rotation::from_degrees(enc.rotation).unwrap_or_else(|| {
            tracing::warn!("rotation {} is not a right angle; not rotating", enc.rotation);
            Rotation::None
        });
        let output_size = (enc.output_width > 0 && enc.output_height > 0)
            .then_some((enc.output_width, enc.output_height));

        SenderConfig {
            fps: self.capture.fps,
            region: Region::new(
                self.capture.left,
                self.capture.top,
                self.capture.width,
                self.capture.height,
            ),
            encoder: EncoderConfig {
                format: enc.format,
                quality: enc.quality.clamp(1, 100),
                output_size,
                rotation,
                compression: enc.compression,
            },
            keepalive_after: (enc.keepalive_ms > 0).then(|| Duration::from_millis(enc.keepalive_ms)),
            skip_unchanged: enc.skip_unchanged,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = toml::to_string_pretty(&SenderFileConfig::default()).unwrap();
        assert!(text.contains("host"));
        assert!(text.contains("fps"));
        assert!(text.contains("transport = \"tcp\""));
    }

    #[test]
    fn roundtrip_config() {
        let text = toml::to_string_pretty(&SenderFileConfig::default()).unwrap();
        let parsed: SenderFileConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.network.port, 5000);
        assert_eq!(parsed.capture.width, 240);
        assert_eq!(parsed.encoding.quality, 50);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let parsed: SenderFileConfig = toml::from_str(
            r#"
            [network]
            host = "display.local"
            transport = "udp"

            [encoding]
            compression = "zstd"
            rotation = 90
            "#,
        )
        .unwrap();
        assert_eq!(parsed.network.host, "display.local");
        assert_eq!(parsed.network.transport, TransportKind::Udp);
        assert_eq!(parsed.network.port, 5000);

        let cfg = parsed.to_sender_config();
        assert_eq!(cfg.encoder.compression, Compression::Zstd);
        assert_eq!(cfg.encoder.rotation, Rotation::Cw90);
        assert_eq!(cfg.encoder.format, ImageFormat::Jpeg);
    }

    #[test]
    fn to_sender_config_maps_defaults() {
        let cfg = SenderFileConfig::default().to_sender_config();
        assert_eq!(cfg.region, Region::new(0, 0, 240, 240));
        assert_eq!(cfg.period(), Duration::from_millis(100));
        assert_eq!(cfg.keepalive_after, Some(Duration::from_secs(2)));
        assert_eq!(cfg.encoder.output_size, None);
    }

    #[test]
    fn zero_values_disable_options() {
        let mut file = SenderFileConfig::default();
        file.encoding.keepalive_ms = 0;
        file.encoding.output_width = 120;
        file.encoding.output_height = 0;
        file.encoding.quality = 0;
        file.encoding.rotation = 45;

        let cfg = file.to_sender_config();
        assert_eq!(cfg.keepalive_after, None);
        assert_eq!(cfg.encoder.output_size, None);
        assert_eq!(cfg.encoder.quality, 1);
        assert_eq!(cfg.encoder.rotation, Rotation::None);
    }

    #[test]
    fn write_default_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sender.toml");
        SenderFileConfig::write_default(&path).unwrap();
        let loaded = SenderFileConfig::load(&path);
        assert_eq!(loaded.network.backoff_ms, 5000);
        assert_eq!(loaded.backoff(), Duration::from_secs(5));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let loaded = SenderFileConfig::load(Path::new("/nonexistent/framecast.toml"));
        assert_eq!(loaded.capture.source, "pattern");
    }
}
