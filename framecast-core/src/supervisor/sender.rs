//! Sender-side supervisor: connect, pump, back off, repeat.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::pipeline::capture::CaptureSource;
use crate::pipeline::sender::SenderPump;
use crate::supervisor::connect::Connector;

/// Delay between a failure and the next connection attempt.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Counters for the retry loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    /// Connection attempts made.
    pub attempts: u64,
    /// Attempts that produced a session.
    pub sessions: u64,
    /// Connect or session failures.
    pub failures: u64,
    /// Backoff sleeps started.
    pub backoffs: u64,
}

pub struct SenderSupervisor<K, C> {
    connector: K,
    pump: SenderPump<C>,
    backoff: Duration,
    stats: SupervisorStats,
}

impl<K: Connector, C: CaptureSource> SenderSupervisor<K, C> {
    pub fn new(connector: K, pump: SenderPump<C>) -> Self {
        Self {
            connector,
            pump,
            backoff: DEFAULT_BACKOFF,
            stats: SupervisorStats::default(),
        }
    }

    /// Override the fixed backoff interval.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn stats(&self) -> &SupervisorStats {
        &self.stats
    }

    pub fn pump(&self) -> &SenderPump<C> {
        &self.pump
    }

    /// Run until `cancel` fires. Failures never escape this loop.
    pub async fn run(&mut self, cancel: &CancellationToken) -> SupervisorStats {
        let target = self.connector.target();

        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.stats.attempts += 1;

            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                r = self.connector.connect() => r,
            };

            match connected {
                Ok(mut transport) => {
                    self.stats.sessions += 1;
                    match transport.peer_addr() {
                        Some(peer) => info!("connected to {target} ({peer})"),
                        None => info!("connected to {target}"),
                    }

                    let outcome = self.pump.run_session(&mut transport, cancel).await;
                    transport.close().await;

                    if let Err(e) = outcome {
                        self.stats.failures += 1;
                        warn!("session with {target} ended: {e}");
                    }
                }
                Err(e) => {
                    self.stats.failures += 1;
                    warn!("connect attempt {} to {target} failed: {e}", self.stats.attempts);
                }
            }

            if cancel.is_cancelled() {
                break;
            }
            self.stats.backoffs += 1;
            info!("retrying in {:?}", self.backoff);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }

        info!(
            "sender stopped after {} attempts, {} sessions, {} frames",
            self.stats.attempts,
            self.stats.sessions,
            self.pump.stats().frames_sent
        );
        self.stats.clone()
    }
}
