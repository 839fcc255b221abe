//! Transport Channel: byte-level plumbing beneath the frame codec.
//!
//! A [`Transport`] offers exactly two data primitives: write every byte
//! of a buffer, and read exactly `n` bytes. Neither knows anything about
//! frames. Two implementations ship:
//!
//! | Type                  | Socket          | End of session             |
//! |-----------------------|-----------------|----------------------------|
//! | [`StreamTransport`]   | TCP (any stream)| peer close → `ShortRead`   |
//! | [`DatagramTransport`] | UDP             | inactivity timeout only    |

mod datagram;
mod stream;

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CastError;

pub use datagram::{DEFAULT_MTU, DatagramTransport};
pub use stream::StreamTransport;

/// Which socket family a session runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Ordered byte stream; peer close is detected immediately.
    #[default]
    Tcp,
    /// Best-effort datagrams; loss and reordering are possible.
    Udp,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

impl std::str::FromStr for TransportKind {
    type Err = CastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(CastError::Other(format!(
                "unknown transport '{other}' (expected tcp or udp)"
            ))),
        }
    }
}

/// A connection owned exclusively by one session.
#[async_trait]
pub trait Transport: Send {
    /// Write all of `data`, or fail. Never retries after a failure.
    async fn send_all(&mut self, data: &[u8]) -> Result<(), CastError>;

    /// Read exactly `n` bytes.
    ///
    /// Fails with [`CastError::ShortRead`] when the peer closes before
    /// `n` bytes were delivered. `n == 0` completes immediately.
    async fn recv_exact(&mut self, n: usize) -> Result<Bytes, CastError>;

    /// Remote address, when known.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Release the connection. Errors during close are ignored.
    async fn close(&mut self);

    /// Whether [`resync`](Transport::resync) can find the next frame
    /// after a corrupt one. A byte stream cannot.
    fn can_resync(&self) -> bool {
        false
    }

    /// Skip buffered bytes up to the next point where a frame may start.
    /// Returns the number of bytes discarded.
    fn resync(&mut self) -> usize {
        0
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send_all(&mut self, data: &[u8]) -> Result<(), CastError> {
        (**self).send_all(data).await
    }

    async fn recv_exact(&mut self, n: usize) -> Result<Bytes, CastError> {
        (**self).recv_exact(n).await
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        (**self).peer_addr()
    }

    async fn close(&mut self) {
        (**self).close().await
    }

    fn can_resync(&self) -> bool {
        (**self).can_resync()
    }

    fn resync(&mut self) -> usize {
        (**self).resync()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kind_parses_case_insensitively() {
        assert_eq!("tcp".parse::<TransportKind>().unwrap(), TransportKind::Tcp);
        assert_eq!("UDP".parse::<TransportKind>().unwrap(), TransportKind::Udp);
        assert!("sctp".parse::<TransportKind>().is_err());
        assert_eq!(TransportKind::Udp.to_string(), "udp");
    }

    #[tokio::test]
    async fn streams_cannot_resync() {
        let (a, _b) = tokio::io::duplex(16);
        let mut t: Box<dyn Transport> = Box::new(StreamTransport::new(a));
        assert!(!t.can_resync());
        assert_eq!(t.resync(), 0);
    }
}
