//! Stream transport over TCP (or any `AsyncRead + AsyncWrite`).

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::CastError;
use crate::transport::Transport;

/// Transport over an ordered byte stream.
pub struct StreamTransport<S> {
    stream: S,
    peer: Option<SocketAddr>,
    bytes_sent: u64,
    bytes_received: u64,
}

impl StreamTransport<TcpStream> {
    /// Wrap a connected TCP stream. Nagle is disabled so small frames
    /// (keep-alives, headers) are not held back.
    pub fn tcp(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("set_nodelay failed: {e}");
        }
        Self {
            stream,
            peer,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }
}

impl<S> StreamTransport<S> {
    /// Wrap an arbitrary stream (loopback pipes in tests).
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            peer: None,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    /// Total bytes written since construction.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Total bytes read since construction.
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_all(&mut self, data: &[u8]) -> Result<(), CastError> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        self.bytes_sent += data.len() as u64;
        Ok(())
    }

    async fn recv_exact(&mut self, n: usize) -> Result<Bytes, CastError> {
        let mut buf = BytesMut::zeroed(n);
        let mut filled = 0;
        while filled < n {
            let read = self.stream.read(&mut buf[filled..]).await?;
            if read == 0 {
                return Err(CastError::ShortRead {
                    expected: n,
                    received: filled,
                });
            }
            filled += read;
            self.bytes_received += read as u64;
        }
        Ok(buf.freeze())
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn recv_exact_reassembles_partial_writes() {
        let (a, b) = tokio::io::duplex(4);
        let mut tx = StreamTransport::new(a);
        let mut rx = StreamTransport::new(b);

        let writer = tokio::spawn(async move {
            tx.send_all(b"hello, display").await.unwrap();
            tx
        });

        let got = rx.recv_exact(14).await.unwrap();
        assert_eq!(&got[..], b"hello, display");
        assert_eq!(rx.bytes_received(), 14);
        assert_eq!(writer.await.unwrap().bytes_sent(), 14);
    }

    #[tokio::test]
    async fn recv_exact_zero_is_noop() {
        let (a, _b) = tokio::io::duplex(16);
        let mut rx = StreamTransport::new(a);
        assert!(rx.recv_exact(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_read_when_peer_closes() {
        let (a, b) = tokio::io::duplex(64);
        let mut tx = StreamTransport::new(a);
        let mut rx = StreamTransport::new(b);

        tx.send_all(&[1, 2, 3]).await.unwrap();
        drop(tx);

        match rx.recv_exact(8).await {
            Err(CastError::ShortRead { expected, received }) => {
                assert_eq!(expected, 8);
                assert_eq!(received, 3);
            }
            other => panic!("expected ShortRead, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tcp_transport_reports_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.unwrap();
            let mut t = StreamTransport::tcp(stream);
            t.send_all(b"ping").await.unwrap();
            t.close().await;
        });

        let (stream, _) = listener.accept().await.unwrap();
        let mut server = StreamTransport::tcp(stream);
        assert!(server.peer_addr().is_some());
        assert_eq!(&server.recv_exact(4).await.unwrap()[..], b"ping");
        client.await.unwrap();

        assert!(matches!(
            server.recv_exact(1).await,
            Err(CastError::ShortRead { received: 0, .. })
        ));
    }
}
