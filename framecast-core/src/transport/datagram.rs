//! Datagram transport over UDP.
//!
//! The frame stream is cut into datagrams of at most [`DEFAULT_MTU`]
//! bytes on send and glued back together on receive. There are no
//! sequence numbers, but every frame starts at the start of a datagram.
//! After a loss the receiver drops the damaged frame and calls
//! [`resync`](Transport::resync), which discards bytes up to the next
//! datagram boundary; headers read from mid-frame boundaries declare
//! absurd lengths and are skipped the same way until a real frame
//! start turns up.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use tokio::net::UdpSocket;

use crate::error::CastError;
use crate::transport::Transport;

/// Maximum transmission unit minus IP (20) + UDP (8) headers.
pub const DEFAULT_MTU: usize = 1400;

/// Largest datagram accepted on receive.
const MAX_DATAGRAM: usize = 64 * 1024;

/// Transport over a UDP socket.
///
/// On the sending side the socket is `connect`ed to the receiver. On the
/// receiving side the transport latches onto the first peer that sends
/// a datagram and ignores everyone else for the rest of the session.
pub struct DatagramTransport {
    socket: Arc<UdpSocket>,
    peer: Option<SocketAddr>,
    pending: BytesMut,
    /// Stream offset of `pending[0]`.
    offset: u64,
    /// Stream offsets where buffered datagrams begin, oldest first.
    boundaries: VecDeque<u64>,
    recv_buf: Vec<u8>,
    mtu: usize,
    connected: bool,
}

impl DatagramTransport {
    /// Wrap a socket that has already been `connect`ed to its peer.
    pub fn connected(socket: UdpSocket) -> Self {
        let peer = socket.peer_addr().ok();
        let mut t = Self::with_peer(Arc::new(socket), peer);
        t.connected = true;
        t
    }

    /// Wrap a shared, bound-but-unconnected socket. The first datagram
    /// received decides the peer.
    pub fn listening(socket: Arc<UdpSocket>) -> Self {
        Self::with_peer(socket, None)
    }

    fn with_peer(socket: Arc<UdpSocket>, peer: Option<SocketAddr>) -> Self {
        Self {
            socket,
            peer,
            pending: BytesMut::new(),
            offset: 0,
            boundaries: VecDeque::new(),
            recv_buf: vec![0u8; MAX_DATAGRAM],
            mtu: DEFAULT_MTU,
            connected: false,
        }
    }

    /// Override the datagram payload size.
    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu.max(1);
        self
    }

    /// Forget boundaries that now lie behind the read position.
    fn trim_boundaries(&mut self) {
        while self.boundaries.front().is_some_and(|&b| b < self.offset) {
            self.boundaries.pop_front();
        }
    }
}

#[async_trait]
impl Transport for DatagramTransport {
    async fn send_all(&mut self, data: &[u8]) -> Result<(), CastError> {
        let peer = self
            .peer
            .ok_or_else(|| CastError::Other("datagram transport has no peer".into()))?;

        for chunk in data.chunks(self.mtu) {
            if self.connected {
                self.socket.send(chunk).await?;
            } else {
                self.socket.send_to(chunk, peer).await?;
            }
        }
        Ok(())
    }

    async fn recv_exact(&mut self, n: usize) -> Result<Bytes, CastError> {
        while self.pending.len() < n {
            let (len, from) = self.socket.recv_from(&mut self.recv_buf).await?;
            match self.peer {
                Some(peer) if peer != from => {
                    tracing::debug!("ignoring datagram from {from}; session peer is {peer}");
                    continue;
                }
                Some(_) => {}
                None => self.peer = Some(from),
            }
            self.boundaries
                .push_back(self.offset + self.pending.len() as u64);
            self.pending.extend_from_slice(&self.recv_buf[..len]);
        }
        let out = self.pending.split_to(n).freeze();
        self.offset += n as u64;
        self.trim_boundaries();
        Ok(out)
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    async fn close(&mut self) {
        self.offset += self.pending.len() as u64;
        self.pending.clear();
        self.boundaries.clear();
    }

    fn can_resync(&self) -> bool {
        true
    }

    fn resync(&mut self) -> usize {
        // Already at a datagram start, or nothing buffered: the next byte
        // read begins a datagram.
        if self.pending.is_empty() || self.boundaries.front() == Some(&self.offset) {
            return 0;
        }
        let skip = match self.boundaries.iter().find(|&&b| b > self.offset) {
            Some(&next) => (next - self.offset) as usize,
            None => self.pending.len(),
        };
        self.pending.advance(skip);
        self.offset += skip as u64;
        self.trim_boundaries();
        skip
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn large_buffer_spans_many_datagrams() {
        let recv_sock = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let recv_addr = recv_sock.local_addr().unwrap();

        let send_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        send_sock.connect(recv_addr).await.unwrap();
        let mut tx = DatagramTransport::connected(send_sock).with_mtu(512);
        let mut rx = DatagramTransport::listening(recv_sock);
        assert!(rx.peer_addr().is_none());

        let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        tx.send_all(&data).await.unwrap();

        let head = rx.recv_exact(100).await.unwrap();
        let tail = rx.recv_exact(4900).await.unwrap();
        assert_eq!(&head[..], &data[..100]);
        assert_eq!(&tail[..], &data[100..]);
        assert_eq!(rx.peer_addr(), tx.socket.local_addr().ok());
        assert_eq!(rx.resync(), 0);
    }

    #[tokio::test]
    async fn resync_skips_to_next_datagram() {
        let recv_sock = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let send_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        send_sock.connect(recv_sock.local_addr().unwrap()).await.unwrap();

        send_sock.send(b"0123456789").await.unwrap();
        send_sock.send(b"abcdef").await.unwrap();
        send_sock.send(b"WXYZ").await.unwrap();

        let mut rx = DatagramTransport::listening(recv_sock);
        assert!(rx.can_resync());
        assert_eq!(&rx.recv_exact(4).await.unwrap()[..], b"0123");

        // Rest of the first datagram is dropped.
        assert_eq!(rx.resync(), 6);
        assert_eq!(&rx.recv_exact(6).await.unwrap()[..], b"abcdef");

        // On a boundary: nothing to skip.
        assert_eq!(rx.resync(), 0);
        assert_eq!(&rx.recv_exact(2).await.unwrap()[..], b"WX");
        assert_eq!(rx.resync(), 2);
    }

    #[tokio::test]
    async fn resync_across_buffered_datagrams() {
        let recv_sock = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let send_sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        send_sock.connect(recv_sock.local_addr().unwrap()).await.unwrap();

        send_sock.send(b"aaaa").await.unwrap();
        send_sock.send(b"bbbb").await.unwrap();
        send_sock.send(b"cccc").await.unwrap();

        let mut rx = DatagramTransport::listening(recv_sock);
        // Pulls all three datagrams into the buffer.
        assert_eq!(&rx.recv_exact(9).await.unwrap()[..], b"aaaabbbbc");
        assert_eq!(rx.resync(), 3);

        send_sock.send(b"dd").await.unwrap();
        assert_eq!(&rx.recv_exact(2).await.unwrap()[..], b"dd");
    }

    #[tokio::test]
    async fn listening_side_cannot_send_before_peer_known() {
        let sock = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let mut t = DatagramTransport::listening(sock);
        assert!(t.send_all(b"x").await.is_err());
    }
}
