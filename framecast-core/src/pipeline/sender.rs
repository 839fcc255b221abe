//! Sender Pump.
//!
//! One blocking pipeline per tick: capture → transform → encode →
//! length-prefix → send. A failed send is never retried; the error goes
//! straight back to the supervisor. Pacing is best-effort: an overrun
//! tick simply makes the next one late.

use std::time::Duration;

use bytes::BytesMut;
use tokio::time::Instant;
use tokio_util::codec::Encoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::codec::FrameCodec;
use crate::error::CastError;
use crate::pipeline::capture::CaptureSource;
use crate::pipeline::encoder::{EncoderConfig, FrameEncoder};
use crate::pipeline::types::Region;
use crate::transport::Transport;

// ── SenderConfig ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Target frames per second.
    pub fps: f64,
    /// Screen region to capture.
    pub region: Region,
    pub encoder: EncoderConfig,
    /// Send a zero-length frame after this much silence.
    pub keepalive_after: Option<Duration>,
    /// Do not resend a payload identical to the previous one.
    pub skip_unchanged: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            fps: 10.0,
            region: Region::default(),
            encoder: EncoderConfig::default(),
            keepalive_after: Some(Duration::from_secs(2)),
            skip_unchanged: false,
        }
    }
}

impl SenderConfig {
    /// Tick period derived from `fps` (clamped to 0.1..=120).
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.clamp(0.1, 120.0))
    }
}

// ── SenderStats ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderStats {
    pub frames_sent: u64,
    pub frames_skipped: u64,
    pub keepalives_sent: u64,
    /// Bytes written including length prefixes.
    pub bytes_sent: u64,
}

// ── SenderPump ───────────────────────────────────────────────────

pub struct SenderPump<C> {
    capture: C,
    encoder: FrameEncoder,
    codec: FrameCodec,
    out: BytesMut,
    config: SenderConfig,
    stats: SenderStats,
    last_digest: Option<blake3::Hash>,
}

impl<C: CaptureSource> SenderPump<C> {
    pub fn new(capture: C, config: SenderConfig) -> Self {
        Self {
            capture,
            encoder: FrameEncoder::new(config.encoder.clone()),
            codec: FrameCodec,
            out: BytesMut::new(),
            config,
            stats: SenderStats::default(),
            last_digest: None,
        }
    }

    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Pump frames into `transport` until a failure or cancellation.
    ///
    /// Returns `Ok(())` only when `cancel` fired.
    pub async fn run_session<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        cancel: &CancellationToken,
    ) -> Result<(), CastError> {
        let period = self.config.period();
        let mut last_sent = Instant::now();
        // Every session starts with a full frame.
        self.last_digest = None;

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let tick_start = Instant::now();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                r = self.tick(transport, &mut last_sent) => r?,
            }

            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = pace(tick_start, period) => {}
            }
        }
    }

    /// One capture → send cycle.
    async fn tick<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        last_sent: &mut Instant,
    ) -> Result<(), CastError> {
        let raw = self.capture.capture(&self.config.region)?;
        let payload = self.encoder.encode(&raw)?;

        if self.config.skip_unchanged {
            let digest = blake3::hash(&payload);
            if self.last_digest == Some(digest) {
                self.stats.frames_skipped += 1;
                trace!("frame unchanged; not sent");
                return self.maybe_keepalive(transport, last_sent).await;
            }
            self.last_digest = Some(digest);
        }

        self.send_payload(transport, &payload).await?;
        self.stats.frames_sent += 1;
        *last_sent = Instant::now();
        Ok(())
    }

    async fn maybe_keepalive<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        last_sent: &mut Instant,
    ) -> Result<(), CastError> {
        let Some(threshold) = self.config.keepalive_after else {
            return Ok(());
        };
        if last_sent.elapsed() < threshold {
            return Ok(());
        }
        self.send_payload(transport, &[]).await?;
        self.stats.keepalives_sent += 1;
        *last_sent = Instant::now();
        debug!("keep-alive sent");
        Ok(())
    }

    async fn send_payload<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        payload: &[u8],
    ) -> Result<(), CastError> {
        self.out.clear();
        self.codec.encode(payload, &mut self.out)?;
        transport.send_all(&self.out).await?;
        self.stats.bytes_sent += self.out.len() as u64;
        Ok(())
    }
}

/// Sleep for the remainder of the tick period.
async fn pace(tick_start: Instant, period: Duration) {
    let elapsed = tick_start.elapsed();
    if elapsed < period {
        tokio::time::sleep(period - elapsed).await;
    }
}

// ── Tests ────────────────────────────────────────────────────────
