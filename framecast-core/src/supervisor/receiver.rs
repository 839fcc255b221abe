//! Receiver-side supervisor: bind once, then accept sessions forever.
//!
//! While no session is active the waiting placeholder is redrawn on a
//! fixed cadence so its status text stays current.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, UdpSocket};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CastError;
use crate::pipeline::display::DisplaySink;
use crate::pipeline::placeholder::StatusSource;
use crate::pipeline::receiver::{Receiver, SessionEnd};
use crate::state::ReceiverStats;
use crate::transport::{DatagramTransport, StreamTransport, TransportKind};

/// Placeholder redraw cadence while waiting.
pub const DEFAULT_PLACEHOLDER_REFRESH: Duration = Duration::from_secs(2);

/// UDP has no close; a session without an inactivity window would never end.
pub const DEFAULT_DATAGRAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to listen.
#[derive(Debug, Clone)]
pub struct ListenConfig {
    pub bind: SocketAddr,
    pub transport: TransportKind,
    /// Bind attempts before giving up (at least one).
    pub bind_attempts: u32,
    pub bind_retry_delay: Duration,
    pub placeholder_refresh: Duration,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: ([0, 0, 0, 0], 5000).into(),
            transport: TransportKind::Tcp,
            bind_attempts: 3,
            bind_retry_delay: Duration::from_secs(1),
            placeholder_refresh: DEFAULT_PLACEHOLDER_REFRESH,
        }
    }
}

enum Listener {
    Tcp(TcpListener),
    Udp(Arc<UdpSocket>),
}

pub struct ReceiverSupervisor<D, S> {
    receiver: Receiver<D, S>,
    listener: Listener,
    config: ListenConfig,
}

impl<D: DisplaySink, S: StatusSource> ReceiverSupervisor<D, S> {
    /// Acquire the listening socket, retrying briefly. A persistent
    /// failure is returned as [`CastError::Bind`].
    pub async fn bind(mut receiver: Receiver<D, S>, config: ListenConfig) -> Result<Self, CastError> {
        let listener = match config.transport {
            TransportKind::Tcp => Listener::Tcp(
                bind_with_retry(&config, |addr| TcpListener::bind(addr)).await?,
            ),
            TransportKind::Udp => {
                if receiver.config().inactivity_timeout.is_none() {
                    warn!(
                        "udp receiver without inactivity timeout; using {:?}",
                        DEFAULT_DATAGRAM_TIMEOUT
                    );
                    receiver.set_inactivity_timeout(Some(DEFAULT_DATAGRAM_TIMEOUT));
                }
                Listener::Udp(Arc::new(
                    bind_with_retry(&config, |addr| UdpSocket::bind(addr)).await?,
                ))
            }
        };

        Ok(Self {
            receiver,
            listener,
            config,
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, CastError> {
        Ok(match &self.listener {
            Listener::Tcp(l) => l.local_addr()?,
            Listener::Udp(s) => s.local_addr()?,
        })
    }

    pub fn receiver(&self) -> &Receiver<D, S> {
        &self.receiver
    }

    /// Serve sessions until `cancel` fires, then leave the display dark.
    pub async fn run(mut self, cancel: CancellationToken) -> ReceiverStats {
        if let Err(e) = self.receiver.start() {
            warn!("display start: {e}");
        }
        info!(
            "listening on {}/{}",
            self.local_addr().map(|a| a.to_string()).unwrap_or_default(),
            self.config.transport
        );

        let mut refresh = tokio::time::interval(self.config.placeholder_refresh);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        refresh.reset();

        loop {
            let end = match &self.listener {
                Listener::Tcp(listener) => {
                    let accepted = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        r = listener.accept() => r,
                        _ = refresh.tick() => {
                            refresh_placeholder(&mut self.receiver);
                            continue;
                        }
                    };
                    match accepted {
                        Ok((stream, peer)) => {
                            info!("accepted {peer}");
                            self.receiver
                                .run_session(StreamTransport::tcp(stream), &cancel)
                                .await
                        }
                        Err(e) => {
                            warn!("accept error: {e}");
                            continue;
                        }
                    }
                }
                Listener::Udp(socket) => {
                    let socket = Arc::clone(socket);
                    let ready = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        r = socket.readable() => r,
                        _ = refresh.tick() => {
                            refresh_placeholder(&mut self.receiver);
                            continue;
                        }
                    };
                    if let Err(e) = ready {
                        warn!("udp socket error: {e}");
                        continue;
                    }
                    self.receiver
                        .run_session(DatagramTransport::listening(socket), &cancel)
                        .await
                }
            };

            if matches!(end, SessionEnd::Shutdown) {
                break;
            }
            refresh.reset();
        }

        if let Err(e) = self.receiver.shutdown() {
            warn!("display shutdown: {e}");
        }
        let stats = self.receiver.stats().clone();
        info!(
            "receiver stopped: {} sessions, {} frames presented, {} dropped",
            stats.sessions, stats.frames_presented, stats.frames_dropped
        );
        stats
    }
}

fn refresh_placeholder<D: DisplaySink, S: StatusSource>(receiver: &mut Receiver<D, S>) {
    if let Err(e) = receiver.show_placeholder() {
        warn!("placeholder: {e}");
    }
}

async fn bind_with_retry<T, F, Fut>(config: &ListenConfig, bind: F) -> Result<T, CastError>
where
    F: Fn(SocketAddr) -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let attempts = config.bind_attempts.max(1);
    let mut attempt = 1;
    loop {
        match bind(config.bind).await {
            Ok(bound) => return Ok(bound),
            Err(e) if attempt < attempts => {
                warn!(
                    "bind {} failed (attempt {attempt}/{attempts}): {e}",
                    config.bind
                );
                attempt += 1;
                tokio::time::sleep(config.bind_retry_delay).await;
            }
            Err(source) => {
                return Err(CastError::Bind {
                    addr: config.bind,
                    source,
                });
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::display::MemoryDisplay;
    use crate::pipeline::placeholder::StaticStatus;
    use crate::pipeline::receiver::ReceiverConfig;

    fn receiver() -> Receiver<MemoryDisplay, StaticStatus> {
        Receiver::new(
            MemoryDisplay::new(16, 16),
            StaticStatus::default(),
            ReceiverConfig::default(),
        )
    }

    fn local(transport: TransportKind) -> ListenConfig {
        ListenConfig {
            bind: ([127, 0, 0, 1], 0).into(),
            transport,
            bind_attempts: 2,
            bind_retry_delay: Duration::from_millis(10),
            ..ListenConfig::default()
        }
    }

    #[tokio::test]
    async fn port_in_use_is_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ListenConfig {
            bind: taken.local_addr().unwrap(),
            ..local(TransportKind::Tcp)
        };

        let err = match ReceiverSupervisor::bind(receiver(), config).await {
            Ok(_) => panic!("bound a port that is in use"),
            Err(e) => e,
        };
        assert!(err.is_process_fatal());
    }

    #[tokio::test]
    async fn udp_bind_installs_inactivity_timeout() {
        let sup = ReceiverSupervisor::bind(receiver(), local(TransportKind::Udp))
            .await
            .unwrap();
        assert_eq!(
            sup.receiver().config().inactivity_timeout,
            Some(DEFAULT_DATAGRAM_TIMEOUT)
        );
        assert_ne!(sup.local_addr().unwrap().port(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn placeholder_refreshes_while_waiting() {
        let sup = ReceiverSupervisor::bind(receiver(), local(TransportKind::Tcp))
            .await
            .unwrap();
        let status = sup.receiver().subscribe();
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(6500)).await;
            stopper.cancel();
        });
        let stats = sup.run(cancel).await;

        // One at start, then at 2 s, 4 s and 6 s.
        assert_eq!(stats.placeholders, 4);
        assert!(status.borrow().phase.is_waiting());
    }
}
