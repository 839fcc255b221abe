//! # framecast-core
//!
//! Point-to-point streaming of still-image frames from a screen
//! capturer to a small display over TCP or UDP.
//!
//! This crate contains:
//! - **Codec**: 8-byte big-endian length prefix framing
//! - **Transport**: `Transport` trait with stream (TCP) and datagram (UDP) channels
//! - **Pipeline**: capture → encode on the sender, decode → present on the receiver
//! - **State**: the receiver's `WAITING` / `STREAMING` phase and counters
//! - **Supervisor**: reconnect-with-backoff (sender), bind-and-accept (receiver)
//! - **Knob**: rotary encoder decoding and a pin-polling loop, independent
//!   of the network and not driven by either binary
//! - **Error**: `CastError`, classified as frame-, session- or process-fatal

pub mod codec;
pub mod error;
pub mod knob;
pub mod pipeline;
pub mod state;
pub mod supervisor;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{FrameCodec, HEADER_LEN};
pub use error::CastError;
pub use knob::{Direction, Knob, KnobEvent, PinLevels, PinReader, run_knob};
pub use pipeline::{
    CaptureSource, Compression, DisplaySink, EncoderConfig, ImageFormat, Receiver,
    ReceiverConfig, Region, Rotation, SenderConfig, SenderPump, StatusSource,
};
pub use state::{ReceiverPhase, ReceiverStats, ReceiverStatus};
pub use supervisor::{
    Connector, ListenConfig, ReceiverSupervisor, SenderSupervisor, TcpConnector, UdpConnector,
};
pub use transport::{DatagramTransport, StreamTransport, Transport, TransportKind};
