//! Reassembling chunk rows into byte streams.

use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use tracing::debug;

use crate::addressing::{ByteRange, ChunkLength, ChunkSpan};
use crate::backend::{ChunkBackend, ChunkRow, Consistency};
use crate::error::{BinaryStoreError, Result};
use crate::orchestrator::{ordered_concat, translate_rows};
use crate::stream::{window, BinaryStream};

/// Stream every chunk of `identifier` in index order.
///
/// Resolves once chunk 0 arrived; fails with
/// [`BinaryStoreError::MissingObject`] when nothing is stored.
pub async fn read_all(
    backend: &dyn ChunkBackend,
    identifier: &str,
    consistency: Consistency,
) -> Result<BinaryStream> {
    let rows = translate_rows("read", identifier, backend.get_all_chunks(identifier, consistency));
    open_span(identifier.to_string(), 0, rows).await
}

/// Stream the bytes of each range, concatenated in the order given.
///
/// The chunk spans of all ranges are requested concurrently; the output is
/// still assembled in caller order. A range reaching past the end of the
/// object yields only the bytes that exist. No ranges means the whole object.
pub async fn read_ranges(
    backend: &dyn ChunkBackend,
    identifier: &str,
    ranges: &[ByteRange],
    chunk_length: ChunkLength,
    consistency: Consistency,
) -> Result<BinaryStream> {
    if ranges.is_empty() {
        return read_all(backend, identifier, consistency).await;
    }

    let parts: Vec<_> = ranges
        .iter()
        .map(|range| {
            let span = ChunkSpan::for_range(*range, chunk_length);
            debug!(
                identifier,
                range = %range,
                first_chunk = span.first_chunk,
                last_chunk = span.last_chunk,
                "reading range"
            );
            let rows = translate_rows(
                "read",
                identifier,
                backend.get_chunk_range(identifier, span.first_chunk, span.last_chunk, consistency),
            );
            let identifier = identifier.to_string();
            async move {
                let chunks = open_span(identifier, span.first_chunk, rows).await?;
                Ok::<_, BinaryStoreError>(window(chunks, span.skip, span.length))
            }
        })
        .collect();

    ordered_concat(parts).await
}

/// Wait for the first row of a span, then stream the payloads.
///
/// Rows must be contiguous from `first`: an absent first row means the object
/// is missing, a hole later on is reported as a missing chunk.
async fn open_span(
    identifier: String,
    first: u64,
    mut rows: BoxStream<'static, Result<ChunkRow>>,
) -> Result<BinaryStream> {
    let head = match rows.try_next().await? {
        Some(row) if row.index == first => row,
        _ => return Err(BinaryStoreError::MissingObject(identifier)),
    };

    let tail = stream::try_unfold(
        (rows, identifier, first + 1),
        |(mut rows, identifier, expected)| async move {
            let Some(row) = rows.try_next().await? else {
                return Ok(None);
            };
            if row.index != expected {
                return Err(BinaryStoreError::MissingChunk {
                    identifier,
                    index: expected,
                });
            }
            Ok(Some((row.chunk, (rows, identifier, expected + 1))))
        },
    );

    Ok(stream::once(async move { Ok::<Bytes, BinaryStoreError>(head.chunk) })
        .chain(tail)
        .boxed())
}
