//! Locating and connecting to the receiver.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpStream, UdpSocket};

use crate::error::CastError;
use crate::transport::{DatagramTransport, StreamTransport, Transport};

/// Produces a fresh transport for each sender session.
#[async_trait]
pub trait Connector: Send {
    async fn connect(&mut self) -> Result<Box<dyn Transport>, CastError>;

    /// Human-readable target, for logs.
    fn target(&self) -> String;
}

#[async_trait]
impl<K: Connector + ?Sized> Connector for Box<K> {
    async fn connect(&mut self) -> Result<Box<dyn Transport>, CastError> {
        (**self).connect().await
    }

    fn target(&self) -> String {
        (**self).target()
    }
}

/// Resolve `host:port`, preferring IPv4.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr, CastError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| CastError::Discovery(format!("{host}: {e}")))?
        .collect();

    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| CastError::Discovery(format!("{host}: no addresses")))
}

// ── TcpConnector ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&mut self) -> Result<Box<dyn Transport>, CastError> {
        let addr = resolve(&self.host, self.port).await?;
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| CastError::Timeout(self.timeout))??;
        Ok(Box::new(StreamTransport::tcp(stream)))
    }

    fn target(&self) -> String {
        format!("tcp://{}:{}", self.host, self.port)
    }
}

// ── UdpConnector ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UdpConnector {
    host: String,
    port: u16,
}

impl UdpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[async_trait]
impl Connector for UdpConnector {
    async fn connect(&mut self) -> Result<Box<dyn Transport>, CastError> {
        let addr = resolve(&self.host, self.port).await?;
        let local: SocketAddr = if addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        Ok(Box::new(DatagramTransport::connected(socket)))
    }

    fn target(&self) -> String {
        format!("udp://{}:{}", self.host, self.port)
    }
}

// ── Tests ────────────────────────────────────────────────────────
