//! Splitting a byte source into chunk rows.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::addressing::ChunkLength;
use crate::backend::{ChunkBackend, Consistency};
use crate::error::Result;
use crate::orchestrator::translate;

/// What a completed write persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Chunk rows written, indices `0..chunks`.
    pub chunks: u64,
    /// Total payload bytes.
    pub bytes: u64,
}

/// Persist `reader` as chunks `0, 1, 2, ...` of `identifier`.
///
/// Every chunk but the last is exactly `chunk_length` bytes. A chunk is
/// persisted before the next one is read, so at most one chunk is buffered.
/// An empty source still produces one zero-length chunk, which keeps the
/// object visible to [`ChunkBackend::get_chunk0`].
///
/// On failure the chunks already persisted stay in place.
pub async fn write_chunks<R>(
    backend: &dyn ChunkBackend,
    identifier: &str,
    reader: &mut R,
    chunk_length: ChunkLength,
    consistency: Consistency,
) -> Result<WriteSummary>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut summary = WriteSummary { chunks: 0, bytes: 0 };

    loop {
        let chunk = read_chunk(reader, chunk_length.as_usize()).await?;
        // A source that ends on a chunk boundary gets no trailing empty chunk.
        if chunk.is_empty() && summary.chunks > 0 {
            break;
        }

        let last = chunk.len() < chunk_length.as_usize();
        let len = chunk.len() as u64;
        translate(
            "write",
            identifier,
            backend.put_chunk(identifier, summary.chunks, chunk, consistency),
        )
        .await?;
        debug!(identifier, chunk_index = summary.chunks, bytes = len, "persisted chunk");

        summary.chunks += 1;
        summary.bytes += len;
        if last {
            break;
        }
    }

    Ok(summary)
}

/// Read until `chunk_length` bytes were gathered or the source is exhausted.
async fn read_chunk<R>(reader: &mut R, chunk_length: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; chunk_length];
    let mut filled = 0;
    while filled < chunk_length {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use futures::TryStreamExt;

    use super::*;
    use crate::backend::{ChunkRow, SqliteBackend};
    use crate::error::BinaryStoreError;
    use crate::testing::FlakyBackend;

    const WRITE: Consistency = Consistency::default_write();

    fn len(n: u64) -> ChunkLength {
        ChunkLength::new(n).unwrap()
    }

    async fn stored(backend: &dyn ChunkBackend, id: &str) -> Vec<ChunkRow> {
        backend
            .get_all_chunks(id, Consistency::default_read())
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_chunk_count_is_ceil_of_size() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let l = 4u64;
        for size in [1u64, 3, 4, 5, 8, 9, 17] {
            let id = format!("size-{size}");
            let data = vec![7u8; size as usize];
            let summary = write_chunks(&backend, &id, &mut Cursor::new(data), len(l), WRITE)
                .await
                .unwrap();
            assert_eq!(summary.chunks, size.div_ceil(l), "size {size}");
            assert_eq!(summary.bytes, size);
            assert_eq!(backend.count_chunks(&id).await.unwrap() as u64, size.div_ceil(l));
        }
    }

    #[tokio::test]
    async fn test_empty_source_writes_one_empty_chunk() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        let summary = write_chunks(&backend, "empty", &mut Cursor::new(Vec::new()), len(4), WRITE)
            .await
            .unwrap();
        assert_eq!(summary, WriteSummary { chunks: 1, bytes: 0 });

        let rows = stored(&backend, "empty").await;
        assert_eq!(rows, vec![ChunkRow { index: 0, chunk: Bytes::new() }]);
    }

    #[tokio::test]
    async fn test_chunks_have_full_length_except_last() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        write_chunks(
            &backend,
            "id",
            &mut Cursor::new(b"ABCDEFGHIJKL".to_vec()),
            len(5),
            WRITE,
        )
        .await
        .unwrap();

        let rows = stored(&backend, "id").await;
        let chunks: Vec<&[u8]> = rows.iter().map(|row| row.chunk.as_ref()).collect();
        assert_eq!(chunks, vec![&b"ABCDE"[..], &b"FGHIJ"[..], &b"KL"[..]]);
    }

    #[tokio::test]
    async fn test_short_reads_are_coalesced() {
        // A reader that trickles one byte per read still yields full chunks.
        let (mut tx, mut rx) = tokio::io::duplex(1);
        let feed = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            tx.write_all(b"abcdefg").await.unwrap();
        });

        let backend = SqliteBackend::in_memory().await.unwrap();
        let summary = write_chunks(&backend, "trickle", &mut rx, len(3), WRITE)
            .await
            .unwrap();
        feed.await.unwrap();

        assert_eq!(summary, WriteSummary { chunks: 3, bytes: 7 });
        let sizes: Vec<usize> = stored(&backend, "trickle")
            .await
            .iter()
            .map(|row| row.chunk.len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_failed_put_leaves_prefix() {
        let backend = FlakyBackend::failing_put(SqliteBackend::in_memory().await.unwrap(), 2);
        let err = write_chunks(
            &backend,
            "partial",
            &mut Cursor::new(vec![1u8; 20]),
            len(4),
            WRITE,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            BinaryStoreError::Storage { operation: "write", .. }
        ));
        let indices: Vec<u64> = stored(&backend, "partial")
            .await
            .iter()
            .map(|row| row.index)
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
