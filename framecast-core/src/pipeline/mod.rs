//! # Frame pipeline
//!
//! ```text
//! SENDER                                   RECEIVER
//! ┌──────────────────────┐                ┌────────────────────────┐
//! │ CaptureSource        │                │ codec::read_header     │
//! │   ↓                  │                │   ↓                    │
//! │ FrameEncoder         │  8-byte BE len │ codec::read_body       │
//! │   (resize, rotate,   │ ─────────────► │   ↓                    │
//! │    jpeg/png, zstd)   │  + payload     │ FrameDecoder           │
//! │   ↓                  │                │   ↓                    │
//! │ FrameCodec           │                │ DisplaySink::present   │
//! │   ↓                  │                │                        │
//! │ Transport::send_all  │                │ (placeholder on idle)  │
//! └──────────────────────┘                └────────────────────────┘
//! ```
//!
//! | Module        | Purpose                                         |
//! |---------------|-------------------------------------------------|
//! | `types`       | Region, rotation, image format, compression      |
//! | `capture`     | Capture sources (test pattern, still image)      |
//! | `encoder`     | Transform + image encode + optional zstd         |
//! | `decoder`     | Optional unzstd + image decode + fit to display  |
//! | `display`     | Display collaborator trait, in-memory display    |
//! | `placeholder` | Waiting-screen renderer and status text source   |
//! | `sender`      | Sender Pump                                      |
//! | `receiver`    | Receiver State Machine                           |

pub mod capture;
pub mod decoder;
pub mod display;
pub mod encoder;
pub mod placeholder;
pub mod receiver;
pub mod sender;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────

pub use capture::{CaptureSource, ImageFileSource, TestPattern};
pub use decoder::FrameDecoder;
pub use display::{DisplayLog, DisplaySink, MemoryDisplay};
pub use encoder::{EncoderConfig, FrameEncoder};
pub use placeholder::{StaticStatus, StatusSource, render_placeholder};
pub use receiver::{DEFAULT_MAX_FRAME_BYTES, Receiver, ReceiverConfig, SessionEnd};
pub use sender::{SenderConfig, SenderPump, SenderStats};
pub use types::{Compression, ImageFormat, Region, Rotation};
