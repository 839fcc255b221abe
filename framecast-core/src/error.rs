//! Error taxonomy for the framecast streaming core.
//!
//! Every fallible operation returns `Result<T, CastError>`. Errors are
//! classified by how far they propagate: a frame-fatal error drops one
//! frame, a session-fatal error ends the current connection, and a
//! process-fatal error is surfaced out of the supervisor.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// The canonical error type for framecast.
#[derive(Debug, Error)]
pub enum CastError {
    // ── Transport Errors (session-fatal) ─────────────────────────
    /// The socket layer reported an error (refused, reset, broken pipe).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The peer closed the connection before a full read completed.
    #[error("short read: expected {expected} bytes, got {received}")]
    ShortRead { expected: usize, received: usize },

    /// No data arrived within the inactivity window.
    #[error("no frame received for {0:?}")]
    Timeout(Duration),

    /// The declared frame length exceeds what the receiver accepts.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u64, max: u64 },

    /// The sender could not resolve or locate the receiver.
    #[error("discovery failed: {0}")]
    Discovery(String),

    // ── Frame Errors (frame-fatal) ───────────────────────────────
    /// The compression layer rejected the payload.
    #[error("corrupt frame data: {0}")]
    CorruptData(String),

    /// The payload is not a recognisable image.
    #[error("unidentified image: {0}")]
    UnidentifiedImage(String),

    // ── Process Errors ───────────────────────────────────────────
    /// The listening socket could not be acquired.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    // ── Collaborator Errors ──────────────────────────────────────
    /// The capture source failed to produce an image.
    #[error("capture failed: {0}")]
    Capture(String),

    /// Encoding a captured image failed.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The display collaborator rejected an operation.
    #[error("display error: {0}")]
    Display(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl CastError {
    /// A frame-fatal error drops the current frame and keeps the session.
    pub fn is_frame_fatal(&self) -> bool {
        matches!(self, Self::CorruptData(_) | Self::UnidentifiedImage(_))
    }

    /// A session-fatal error closes the transport and returns to waiting
    /// (receiver) or to backoff-and-reconnect (sender).
    pub fn is_session_fatal(&self) -> bool {
        !self.is_frame_fatal() && !self.is_process_fatal()
    }

    /// Only a bind failure is allowed to terminate the process.
    pub fn is_process_fatal(&self) -> bool {
        matches!(self, Self::Bind { .. })
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for CastError {
    fn from(s: String) -> Self {
        CastError::Other(s)
    }
}

impl From<&str> for CastError {
    fn from(s: &str) -> Self {
        CastError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = CastError::ShortRead {
            expected: 8,
            received: 3,
        };
        assert!(e.to_string().contains('8'));
        assert!(e.to_string().contains('3'));

        let e = CastError::FrameTooLarge { size: 1000, max: 500 };
        assert!(e.to_string().contains("1000"));
        assert!(e.to_string().contains("500"));
    }

    #[test]
    fn classification() {
        assert!(CastError::CorruptData("bad zstd".into()).is_frame_fatal());
        assert!(CastError::UnidentifiedImage("?".into()).is_frame_fatal());

        let short = CastError::ShortRead {
            expected: 8,
            received: 0,
        };
        assert!(short.is_session_fatal());
        assert!(!short.is_frame_fatal());

        let bind = CastError::Bind {
            addr: "0.0.0.0:5000".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(bind.is_process_fatal());
        assert!(!bind.is_session_fatal());
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: CastError = io_err.into();
        assert!(matches!(e, CastError::Transport(_)));
        assert!(e.is_session_fatal());
    }
}
