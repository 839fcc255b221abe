//! Receiver State Machine.
//!
//! Owns the display and the visible [`ReceiverPhase`]. For each session
//! it runs a strictly sequential loop:
//!
//! 1. read header → short read ends the session
//! 2. read body → short read ends the session
//! 3. decompress + decode → failure drops this frame only
//! 4. present
//!
//! A zero-length frame is a keep-alive: nothing is presented. Header and
//! body share one inactivity window.
//!
//! On a datagram link a lost datagram shifts the byte stream, so the
//! frame it belonged to fails to decode and the following header is read
//! from mid-frame data. Both cases discard buffered bytes up to the next
//! datagram boundary and keep streaming.

use std::future::Future;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::CastError;
use crate::pipeline::decoder::FrameDecoder;
use crate::pipeline::display::DisplaySink;
use crate::pipeline::placeholder::{StatusSource, render_placeholder};
use crate::pipeline::types::Compression;
use crate::state::{ReceiverPhase, ReceiverStats, ReceiverStatus};
use crate::transport::Transport;

/// Declared lengths above this are refused unless configured otherwise.
pub const DEFAULT_MAX_FRAME_BYTES: u64 = 16 * 1024 * 1024;

// ── ReceiverConfig ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Compression layer the sender applies on top of the image.
    pub compression: Compression,
    /// End the session when no frame (keep-alives included) arrives
    /// within this window. `None` relies on socket close alone.
    pub inactivity_timeout: Option<Duration>,
    /// Largest accepted declared length.
    pub max_frame_bytes: u64,
    /// Backlight level while running.
    pub backlight: u8,
    /// First line of the waiting placeholder.
    pub waiting_title: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            inactivity_timeout: None,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            backlight: 100,
            waiting_title: "waiting for stream".into(),
        }
    }
}

// ── SessionEnd ───────────────────────────────────────────────────

/// Why a session returned to `Waiting`.
#[derive(Debug)]
pub enum SessionEnd {
    /// The peer closed the connection (possibly mid-frame).
    PeerClosed,
    /// Nothing arrived within the inactivity window.
    TimedOut,
    /// Transport error or unacceptable framing.
    Failed(CastError),
    /// Process shutdown was requested.
    Shutdown,
}

// ── Receiver ─────────────────────────────────────────────────────

pub struct Receiver<D, S> {
    display: D,
    status_source: S,
    decoder: FrameDecoder,
    config: ReceiverConfig,
    status: ReceiverStatus,
    status_tx: watch::Sender<ReceiverStatus>,
}

impl<D: DisplaySink, S: StatusSource> Receiver<D, S> {
    pub fn new(display: D, status_source: S, config: ReceiverConfig) -> Self {
        let decoder = FrameDecoder::new(
            config.compression,
            Some((display.width(), display.height())),
        )
        .with_limit(usize::try_from(config.max_frame_bytes).unwrap_or(usize::MAX));
        let (status_tx, _) = watch::channel(ReceiverStatus::default());
        Self {
            display,
            status_source,
            decoder,
            config,
            status: ReceiverStatus::default(),
            status_tx,
        }
    }

    /// Observe phase and counters.
    pub fn subscribe(&self) -> watch::Receiver<ReceiverStatus> {
        self.status_tx.subscribe()
    }

    pub fn phase(&self) -> &ReceiverPhase {
        &self.status.phase
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.status.stats
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Set the inactivity window used by subsequent sessions.
    pub fn set_inactivity_timeout(&mut self, timeout: Option<Duration>) {
        self.config.inactivity_timeout = timeout;
    }

    /// Power the panel up and show the placeholder.
    pub fn start(&mut self) -> Result<(), CastError> {
        self.display.clear()?;
        self.display.set_backlight(self.config.backlight)?;
        self.show_placeholder()
    }

    /// Leave the panel blank and dark.
    pub fn shutdown(&mut self) -> Result<(), CastError> {
        if self.status.phase.end_session() {
            self.publish();
        }
        self.display.clear()?;
        self.display.set_backlight(0)
    }

    /// Redraw the waiting placeholder with fresh status text.
    pub fn show_placeholder(&mut self) -> Result<(), CastError> {
        let lines = self.status_source.status_lines();
        let image = render_placeholder(
            self.display.width(),
            self.display.height(),
            &self.config.waiting_title,
            &lines,
        );
        self.display.present(&image)?;
        self.status.stats.placeholders += 1;
        self.publish();
        Ok(())
    }

    /// Serve one session until the peer goes away, the link goes quiet,
    /// or `cancel` fires. Always returns in `Waiting`.
    pub async fn run_session<T: Transport>(
        &mut self,
        mut transport: T,
        cancel: &CancellationToken,
    ) -> SessionEnd {
        let peer = transport.peer_addr();
        if self.status.phase.restart_session(peer) {
            warn!("previous session was still marked active; replaced");
        }
        self.status.stats.sessions += 1;
        self.publish();
        info!("{}", self.status.phase);

        let timeout = self.config.inactivity_timeout;
        let max = self.config.max_frame_bytes;

        let end = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break SessionEnd::Shutdown,
                r = read_frame(&mut transport, timeout, max) => r,
            };

            match next {
                Ok(payload) => {
                    if !self.handle_frame(payload) {
                        self.resync(&mut transport);
                    }
                }
                Err(e @ CastError::FrameTooLarge { .. }) if transport.can_resync() => {
                    debug!("{e}; not a frame start");
                    self.resync(&mut transport);
                }
                Err(CastError::ShortRead { expected, received }) => {
                    debug!("short read ({received}/{expected} bytes)");
                    break SessionEnd::PeerClosed;
                }
                Err(CastError::Timeout(d)) => {
                    warn!("no frame for {d:?}; dropping session");
                    break SessionEnd::TimedOut;
                }
                Err(e) => break SessionEnd::Failed(e),
            }
        };

        transport.close().await;
        let duration = self.status.phase.streaming_duration().unwrap_or_default();
        self.status.phase.end_session();
        self.publish();

        match &end {
            SessionEnd::PeerClosed => info!("peer disconnected after {duration:?}"),
            SessionEnd::TimedOut => info!("session timed out after {duration:?}"),
            SessionEnd::Failed(e) => warn!("session failed after {duration:?}: {e}"),
            SessionEnd::Shutdown => info!("session closed for shutdown"),
        }

        if !matches!(end, SessionEnd::Shutdown) {
            if let Err(e) = self.show_placeholder() {
                warn!("placeholder: {e}");
            }
        }
        end
    }

    /// Decode and present one payload. Never ends the session; returns
    /// false when the payload was dropped.
    fn handle_frame(&mut self, payload: Bytes) -> bool {
        if payload.is_empty() {
            self.status.stats.keepalives += 1;
            debug!("keep-alive");
            self.publish();
            return true;
        }

        self.status.stats.bytes_received += payload.len() as u64;
        let start = Instant::now();

        let presented = self
            .decoder
            .decode(&payload)
            .and_then(|image| self.display.present(&image));

        let ok = match presented {
            Ok(()) => {
                self.status.stats.frames_presented += 1;
                debug!(
                    "frame {} ({} bytes) presented in {:?}",
                    self.status.stats.frames_presented,
                    payload.len(),
                    start.elapsed()
                );
                true
            }
            Err(e) => {
                self.status.stats.frames_dropped += 1;
                warn!("dropping frame ({} bytes): {e}", payload.len());
                false
            }
        };
        self.publish();
        ok
    }

    /// Skip to the next point where a frame may start. No-op on streams.
    fn resync<T: Transport + ?Sized>(&mut self, transport: &mut T) {
        let skipped = transport.resync();
        if transport.can_resync() {
            self.status.stats.resyncs += 1;
            debug!("resync: discarded {skipped} buffered bytes");
            self.publish();
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status.clone());
    }
}

/// Read one frame, enforcing the size cap and the inactivity window.
/// The whole frame must arrive within one window.
async fn read_frame<T: Transport + ?Sized>(
    transport: &mut T,
    timeout: Option<Duration>,
    max: u64,
) -> Result<Bytes, CastError> {
    within(timeout, async {
        let declared = codec::read_header(transport).await?;
        if declared > max {
            return Err(CastError::FrameTooLarge {
                size: declared,
                max,
            });
        }
        codec::read_body(transport, declared).await
    })
    .await
}

async fn within<T, F>(limit: Option<Duration>, fut: F) -> Result<T, CastError>
where
    F: Future<Output = Result<T, CastError>>,
{
    match limit {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| CastError::Timeout(d))?,
        None => fut.await,
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::display::MemoryDisplay;
    use crate::pipeline::placeholder::StaticStatus;
    use crate::transport::StreamTransport;

    fn receiver(config: ReceiverConfig) -> (Receiver<MemoryDisplay, StaticStatus>, MemoryDisplay) {
        let display = MemoryDisplay::new(32, 32);
        let rx = Receiver::new(
            display.clone(),
            StaticStatus(vec!["host".into()]),
            config,
        );
        (rx, display)
    }

    fn png_frame() -> Bytes {
        let img = image::RgbImage::from_pixel(32, 32, image::Rgb([1, 2, 3]));
        let png = crate::pipeline::encoder::encode_image(
            &img,
            crate::pipeline::types::ImageFormat::Png,
            100,
        )
        .unwrap();
        codec::encode(&png)
    }

    #[tokio::test]
    async fn keepalive_does_not_present() {
        let (mut rx, display) = receiver(ReceiverConfig::default());
        let (a, b) = tokio::io::duplex(256);
        let mut tx = StreamTransport::new(a);
        tx.send_all(&codec::encode(&[])).await.unwrap();
        tx.send_all(&codec::encode(&[])).await.unwrap();
        drop(tx);

        let end = rx
            .run_session(StreamTransport::new(b), &CancellationToken::new())
            .await;
        assert!(matches!(end, SessionEnd::PeerClosed));
        assert_eq!(rx.stats().keepalives, 2);
        assert_eq!(rx.stats().frames_presented, 0);
        // Only the placeholder shown after the session ended.
        assert_eq!(display.log().presented.len(), 1);
    }

    #[tokio::test]
    async fn good_frame_is_presented() {
        let (mut rx, display) = receiver(ReceiverConfig::default());
        let (a, b) = tokio::io::duplex(64 * 1024);
        let mut tx = StreamTransport::new(a);
        tx.send_all(&png_frame()).await.unwrap();
        drop(tx);

        rx.run_session(StreamTransport::new(b), &CancellationToken::new())
            .await;
        assert_eq!(rx.stats().frames_presented, 1);
        assert_eq!(display.log().presented[0].get_pixel(0, 0).0, [1, 2, 3]);
        assert!(rx.phase().is_waiting());
    }

    #[tokio::test(start_paused = true)]
    async fn inactivity_timeout_ends_session() {
        let (mut rx, _display) = receiver(ReceiverConfig {
            inactivity_timeout: Some(Duration::from_secs(3)),
            ..ReceiverConfig::default()
        });
        let (_a, b) = tokio::io::duplex(64);

        let end = rx
            .run_session(StreamTransport::new(b), &CancellationToken::new())
            .await;
        assert!(matches!(end, SessionEnd::TimedOut));
        assert!(rx.phase().is_waiting());
    }

    #[tokio::test]
    async fn oversized_declaration_fails_session() {
        let (mut rx, _display) = receiver(ReceiverConfig {
            max_frame_bytes: 16,
            ..ReceiverConfig::default()
        });
        let (a, b) = tokio::io::duplex(64);
        let mut tx = StreamTransport::new(a);
        tx.send_all(&17u64.to_be_bytes()).await.unwrap();

        let end = rx
            .run_session(StreamTransport::new(b), &CancellationToken::new())
            .await;
        assert!(matches!(
            end,
            SessionEnd::Failed(CastError::FrameTooLarge { size: 17, max: 16 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_frame_times_out_within_one_window() {
        let (mut rx, _display) = receiver(ReceiverConfig {
            inactivity_timeout: Some(Duration::from_secs(3)),
            ..ReceiverConfig::default()
        });
        let (a, b) = tokio::io::duplex(64 * 1024);
        let frame = png_frame();

        // Each piece lands inside the window, but the whole frame takes
        // longer than one window.
        let feeder = tokio::spawn(async move {
            let mut tx = StreamTransport::new(a);
            let _ = tx.send_all(&frame[..4]).await;
            tokio::time::sleep(Duration::from_secs(2)).await;
            let _ = tx.send_all(&frame[4..8]).await;
            tokio::time::sleep(Duration::from_secs(2)).await;
            let _ = tx.send_all(&frame[8..]).await;
            tx
        });

        let start = tokio::time::Instant::now();
        let end = rx
            .run_session(StreamTransport::new(b), &CancellationToken::new())
            .await;
        assert!(matches!(end, SessionEnd::TimedOut));
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
        assert_eq!(rx.stats().frames_presented, 0);
        drop(feeder);
    }

    #[tokio::test]
    async fn undecodable_frame_on_stream_keeps_session() {
        let (mut rx, _display) = receiver(ReceiverConfig::default());
        let (a, b) = tokio::io::duplex(64 * 1024);
        let mut tx = StreamTransport::new(a);
        tx.send_all(&codec::encode(b"not an image")).await.unwrap();
        tx.send_all(&png_frame()).await.unwrap();
        drop(tx);

        let end = rx
            .run_session(StreamTransport::new(b), &CancellationToken::new())
            .await;
        assert!(matches!(end, SessionEnd::PeerClosed));
        assert_eq!(rx.stats().frames_dropped, 1);
        assert_eq!(rx.stats().frames_presented, 1);
        assert_eq!(rx.stats().resyncs, 0);
    }

    #[tokio::test]
    async fn oversized_declaration_on_datagrams_resyncs() {
        use std::sync::Arc;
        use tokio::net::UdpSocket;

        use crate::transport::DatagramTransport;

        let (mut rx, display) = receiver(ReceiverConfig {
            inactivity_timeout: Some(Duration::from_millis(300)),
            ..ReceiverConfig::default()
        });
        let sock = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.connect(sock.local_addr().unwrap()).await.unwrap();

        let mut junk = u64::MAX.to_be_bytes().to_vec();
        junk.extend_from_slice(&[0xAB; 40]);
        sender.send(&junk).await.unwrap();
        sender.send(&png_frame()).await.unwrap();

        let end = rx
            .run_session(DatagramTransport::listening(sock), &CancellationToken::new())
            .await;
        assert!(matches!(end, SessionEnd::TimedOut));
        assert_eq!(rx.stats().resyncs, 1);
        assert_eq!(rx.stats().frames_presented, 1);
        assert_eq!(display.log().presented[0].get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[tokio::test]
    async fn cancel_ends_session_without_placeholder() {
        let (mut rx, display) = receiver(ReceiverConfig::default());
        let (_a, b) = tokio::io::duplex(64);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let end = rx.run_session(StreamTransport::new(b), &cancel).await;
        assert!(matches!(end, SessionEnd::Shutdown));
        assert!(display.log().presented.is_empty());

        rx.shutdown().unwrap();
        assert_eq!(display.log().backlight, Some(0));
    }

    #[test]
    fn start_lights_panel_and_draws_placeholder() {
        let (mut rx, display) = receiver(ReceiverConfig {
            backlight: 80,
            ..ReceiverConfig::default()
        });
        rx.start().unwrap();
        let log = display.log();
        assert_eq!(log.backlight, Some(80));
        assert_eq!(log.presented.len(), 1);
        assert_eq!(rx.stats().placeholders, 1);
    }
}
