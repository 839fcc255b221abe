//! Connection Supervisor: the outer retry loops on both ends.
//!
//! | Side     | Loop                                              | Fatal        |
//! |----------|---------------------------------------------------|--------------|
//! | sender   | connect → pump → fixed backoff → connect …        | never        |
//! | receiver | bind once → accept → session → accept …           | bind failure |
//!
//! Everything below this boundary is absorbed here; only a bind error
//! escapes to the process.

pub mod connect;
pub mod receiver;
pub mod sender;

pub use connect::{Connector, TcpConnector, UdpConnector, resolve};
pub use receiver::{
    DEFAULT_DATAGRAM_TIMEOUT, DEFAULT_PLACEHOLDER_REFRESH, ListenConfig, ReceiverSupervisor,
};
pub use sender::{DEFAULT_BACKOFF, SenderSupervisor, SupervisorStats};
