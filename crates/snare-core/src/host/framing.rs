//! Browser native-messaging framing: a 4-byte native-endian length, then
//! that many bytes of UTF-8 JSON.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest message accepted from the browser.
pub const MAX_INCOMING: usize = 64 * 1024 * 1024;
/// Largest message the browser accepts from a host.
pub const MAX_OUTGOING: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("message of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Read one frame. `Ok(None)` on a clean end of stream.
///
/// An oversized frame is skipped in full before returning
/// [`FrameError::TooLarge`], so the stream stays aligned.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len = [0u8; 4];
    match reader.read_exact(&mut len).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let size = u32::from_ne_bytes(len) as usize;
    if size > MAX_INCOMING {
        let mut rest = (&mut *reader).take(size as u64);
        let skipped = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await?;
        if (skipped as usize) < size {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        return Err(FrameError::TooLarge {
            size,
            limit: MAX_INCOMING,
        });
    }
    let mut payload = vec![0u8; size];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_OUTGOING {
        return Err(FrameError::TooLarge {
            size: payload.len(),
            limit: MAX_OUTGOING,
        });
    }
    let len = payload.len() as u32;
    writer.write_all(&len.to_ne_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}
