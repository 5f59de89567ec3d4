//! Byte streams produced by the read pipeline.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{BinaryStoreError, Result};

/// Reassembled content of a binary: finite, lazy, consumed once.
///
/// Items are chunk payloads (or slices of them) in logical order.
pub type BinaryStream = BoxStream<'static, Result<Bytes>>;

/// Drop the first `skip` bytes of `inner`, then yield at most `length` bytes.
///
/// Once `length` bytes were yielded the inner stream is dropped without being
/// polled again, so no further chunks are fetched.
pub(crate) fn window(inner: BinaryStream, skip: u64, length: u64) -> BinaryStream {
    stream::try_unfold(
        (inner, skip, length),
        |(mut inner, mut skip, mut remaining)| async move {
            while remaining > 0 {
                let Some(mut chunk) = inner.try_next().await? else {
                    break;
                };

                let len = chunk.len() as u64;
                if skip >= len {
                    skip -= len;
                    continue;
                }
                // `skip < len` and `remaining > 0` keep both casts in bounds.
                chunk = chunk.slice(skip as usize..);
                skip = 0;
                if chunk.len() as u64 > remaining {
                    chunk.truncate(remaining as usize);
                }
                remaining -= chunk.len() as u64;
                return Ok(Some((chunk, (inner, skip, remaining))));
            }
            Ok::<_, BinaryStoreError>(None)
        },
    )
    .boxed()
}

/// Buffer a whole stream into memory.
///
/// Only for content known to be small; the store itself never does this.
pub async fn collect_bytes(stream: BinaryStream) -> Result<Bytes> {
    let buf = stream
        .try_fold(BytesMut::new(), |mut buf, chunk| async move {
            buf.extend_from_slice(&chunk);
            Ok(buf)
        })
        .await?;
    Ok(buf.freeze())
}

/// Copy a stream into `writer` chunk by chunk, returning the bytes written.
pub async fn copy_to<W>(mut stream: BinaryStream, writer: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0u64;
    while let Some(chunk) = stream.try_next().await? {
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    Ok(written)
}

#[cfg(test)]
pub(crate) fn from_chunks(chunks: &[&'static [u8]]) -> BinaryStream {
    let chunks: Vec<Result<Bytes>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::from_static(*chunk)))
        .collect();
    stream::iter(chunks).boxed()
}
