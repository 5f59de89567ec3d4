//! Backend wrappers for exercising failure and reordering paths.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, StreamExt};

use crate::backend::{ChunkBackend, ChunkRowStream, Consistency};
use crate::error::BackendError;

/// Passes everything through, except that the `fail_at`-th put fails.
#[derive(Debug)]
pub struct FlakyBackend<B> {
    inner: B,
    fail_at: u64,
    puts: AtomicU64,
}

impl<B: ChunkBackend> FlakyBackend<B> {
    /// Fail the `fail_at`-th put (zero-based). Later puts succeed again.
    pub fn failing_put(inner: B, fail_at: u64) -> Self {
        Self {
            inner,
            fail_at,
            puts: AtomicU64::new(0),
        }
    }
}

#[async_trait::async_trait]
impl<B: ChunkBackend> ChunkBackend for FlakyBackend<B> {
    async fn put_chunk(
        &self,
        identifier: &str,
        index: u64,
        chunk: Bytes,
        consistency: Consistency,
    ) -> Result<(), BackendError> {
        if self.puts.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            return Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "injected write timeout",
            )));
        }
        self.inner
            .put_chunk(identifier, index, chunk, consistency)
            .await
    }

    async fn get_chunk0(
        &self,
        identifier: &str,
        consistency: Consistency,
    ) -> Result<bool, BackendError> {
        self.inner.get_chunk0(identifier, consistency).await
    }

    fn get_all_chunks(&self, identifier: &str, consistency: Consistency) -> ChunkRowStream {
        self.inner.get_all_chunks(identifier, consistency)
    }

    fn get_chunk_range(
        &self,
        identifier: &str,
        first: u64,
        last: u64,
        consistency: Consistency,
    ) -> ChunkRowStream {
        self.inner.get_chunk_range(identifier, first, last, consistency)
    }

    async fn delete_all(&self, identifier: &str) -> Result<(), BackendError> {
        self.inner.delete_all(identifier).await
    }
}

/// Delays the first row of a range read by `step * (horizon - first)`.
///
/// Spans that start early in the object answer last, so concurrent range
/// reads complete in the reverse of their logical order.
#[derive(Debug)]
pub struct ReversedLatencyBackend {
    inner: Arc<dyn ChunkBackend>,
    step: Duration,
    horizon: u64,
}

impl ReversedLatencyBackend {
    pub fn new(inner: Arc<dyn ChunkBackend>, step: Duration, horizon: u64) -> Self {
        Self {
            inner,
            step,
            horizon,
        }
    }

    fn delayed(&self, first: u64, rows: ChunkRowStream) -> ChunkRowStream {
        let factor = u32::try_from(self.horizon.saturating_sub(first)).unwrap_or(u32::MAX);
        let delay = self.step * factor;
        stream::once(async move {
            tokio::time::sleep(delay).await;
            rows
        })
        .flatten()
        .boxed()
    }
}

#[async_trait::async_trait]
impl ChunkBackend for ReversedLatencyBackend {
    async fn put_chunk(
        &self,
        identifier: &str,
        index: u64,
        chunk: Bytes,
        consistency: Consistency,
    ) -> Result<(), BackendError> {
        self.inner
            .put_chunk(identifier, index, chunk, consistency)
            .await
    }

    async fn get_chunk0(
        &self,
        identifier: &str,
        consistency: Consistency,
    ) -> Result<bool, BackendError> {
        self.inner.get_chunk0(identifier, consistency).await
    }

    fn get_all_chunks(&self, identifier: &str, consistency: Consistency) -> ChunkRowStream {
        let rows = self.inner.get_all_chunks(identifier, consistency);
        self.delayed(0, rows)
    }

    fn get_chunk_range(
        &self,
        identifier: &str,
        first: u64,
        last: u64,
        consistency: Consistency,
    ) -> ChunkRowStream {
        let rows = self
            .inner
            .get_chunk_range(identifier, first, last, consistency);
        self.delayed(first, rows)
    }

    async fn delete_all(&self, identifier: &str) -> Result<(), BackendError> {
        self.inner.delete_all(identifier).await
    }
}
