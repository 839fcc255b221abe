//! Frame Codec: 8-byte big-endian length prefix followed by the payload.
//!
//! ```text
//! length:  u64 BE  (8)
//! payload: [u8]    (length)   zero-length = keep-alive
//! ```
//!
//! There are no magic bytes and no checksum. Integrity is whatever the
//! payload's own decompression / image decoding can detect.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Encoder;

use crate::error::CastError;
use crate::transport::Transport;

/// Size of the length prefix on the wire.
pub const HEADER_LEN: usize = 8;

/// Length-prefix encoder. Stateless; reusable across frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl<'a> Encoder<&'a [u8]> for FrameCodec {
    type Error = CastError;

    fn encode(&mut self, payload: &'a [u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u64(payload.len() as u64);
        dst.extend_from_slice(payload);
        Ok(())
    }
}

/// Encode a single payload into a fresh buffer.
pub fn encode(payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(HEADER_LEN + payload.len());
    dst.put_u64(payload.len() as u64);
    dst.extend_from_slice(payload);
    dst.freeze()
}

/// Read the length prefix of the next frame.
pub async fn read_header<T>(transport: &mut T) -> Result<u64, CastError>
where
    T: Transport + ?Sized,
{
    let raw = transport.recv_exact(HEADER_LEN).await?;
    let mut be = [0u8; HEADER_LEN];
    be.copy_from_slice(&raw);
    Ok(u64::from_be_bytes(be))
}

/// Read a frame body of `declared` bytes. Zero is a no-op.
pub async fn read_body<T>(transport: &mut T, declared: u64) -> Result<Bytes, CastError>
where
    T: Transport + ?Sized,
{
    if declared == 0 {
        return Ok(Bytes::new());
    }
    let len = usize::try_from(declared).map_err(|_| CastError::FrameTooLarge {
        size: declared,
        max: usize::MAX as u64,
    })?;
    transport.recv_exact(len).await
}

// ── Tests ────────────────────────────────────────────────────────
