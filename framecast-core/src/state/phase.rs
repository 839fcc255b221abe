//! Receiver-side visible state.
//!
//! ```text
//!             accept / first datagram
//!   Waiting ───────────────────────────► Streaming
//!      ▲                                     │  │ corrupt frame,
//!      │  short read, transport error,       │  │ keep-alive,
//!      └──── timeout, shutdown ──────────────┘  └─ good frame (self-loop)
//! ```
//!
//! There is no terminal state; the receiver runs until process exit.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

// ── ReceiverPhase ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReceiverPhase {
    /// No active peer; the placeholder is shown.
    #[default]
    Waiting,

    /// Frames from `peer` are being decoded and presented.
    Streaming {
        peer: Option<SocketAddr>,
        since: Instant,
    },
}

impl std::fmt::Display for ReceiverPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Streaming { peer: Some(p), .. } => write!(f, "STREAMING from {p}"),
            Self::Streaming { peer: None, .. } => write!(f, "STREAMING"),
        }
    }
}

impl ReceiverPhase {
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming { .. })
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// How long the current session has been streaming.
    pub fn streaming_duration(&self) -> Option<Duration> {
        match self {
            Self::Streaming { since, .. } => Some(since.elapsed()),
            Self::Waiting => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// `Waiting → Streaming`, from any phase. Returns whether a
    /// previous session had to be dropped first.
    pub fn restart_session(&mut self, peer: Option<SocketAddr>) -> bool {
        let was_streaming = self.end_session();
        *self = Self::Streaming {
            peer,
            since: Instant::now(),
        };
        was_streaming
    }

    /// `Streaming → Waiting`. Returns whether a transition happened, so
    /// ending an already-ended session is harmless.
    pub fn end_session(&mut self) -> bool {
        match self {
            Self::Streaming { .. } => {
                *self = Self::Waiting;
                true
            }
            Self::Waiting => false,
        }
    }
}

// ── ReceiverStats ────────────────────────────────────────────────

/// Running counters, kept across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Sessions accepted.
    pub sessions: u64,
    /// Frames decoded and handed to the display.
    pub frames_presented: u64,
    /// Well-framed payloads that failed to decode.
    pub frames_dropped: u64,
    /// Zero-length frames.
    pub keepalives: u64,
    /// Times a datagram link skipped ahead to find a frame start.
    pub resyncs: u64,
    /// Payload bytes read (headers excluded).
    pub bytes_received: u64,
    /// Times the waiting placeholder was drawn.
    pub placeholders: u64,
}

/// Snapshot published to observers on every change.
#[derive(Debug, Clone, Default)]
pub struct ReceiverStatus {
    pub phase: ReceiverPhase,
    pub stats: ReceiverStats,
}

// ── Tests ────────────────────────────────────────────────────────
