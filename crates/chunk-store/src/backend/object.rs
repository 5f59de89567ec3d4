//! Chunk rows as objects (S3/MinIO/local filesystem/memory).
//!
//! Every chunk is stored at `binaries/<identifier>/<index>`, with the
//! identifier base64url-encoded so that arbitrary strings (URIs included)
//! map onto a single path segment, and the index zero-padded so that keys
//! sort in chunk order.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use futures::{stream, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{ChunkBackend, ChunkRow, ChunkRowStream, Consistency};
use crate::error::BackendError;

const ROOT: &str = "binaries";

/// Connection settings for S3-compatible storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
    pub endpoint: String,
    /// Access key ID
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
    /// Bucket name
    pub bucket: String,
    /// Optional region (defaults to "us-east-1")
    #[serde(default)]
    pub region: Option<String>,
}

/// Chunk rows stored one object per chunk.
#[derive(Debug, Clone)]
pub struct ObjectBackend {
    inner: Arc<dyn ObjectStore>,
}

impl ObjectBackend {
    /// In-memory storage (for testing).
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    /// Local filesystem storage rooted at `path`.
    pub async fn local(path: &Path) -> Result<Self, BackendError> {
        // Ensure directory exists
        tokio::fs::create_dir_all(path).await?;
        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| BackendError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(store),
        })
    }

    /// S3-compatible storage. Fails fast when the bucket does not exist.
    pub async fn s3(config: &S3Config) -> Result<Self, BackendError> {
        let S3Config {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
        } = config;

        let builder = AmazonS3Builder::new()
            .with_endpoint(endpoint)
            .with_access_key_id(access_key)
            .with_secret_access_key(secret_key)
            .with_bucket_name(bucket)
            .with_region(region.as_deref().unwrap_or("us-east-1"))
            .with_allow_http(endpoint.starts_with("http://"));

        let store: Arc<dyn ObjectStore> = Arc::new(
            builder
                .build()
                .map_err(|e| BackendError::InvalidConfig(e.to_string()))?,
        );

        // Verify bucket exists by listing (empty prefix)
        let prefix = ObjectPath::from("");
        let mut listing = store.list(Some(&prefix));
        match listing.try_next().await {
            Ok(_) => {}
            Err(object_store::Error::NotFound { .. }) => {
                return Err(BackendError::BucketNotFound(bucket.clone()));
            }
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("NoSuchBucket") || msg.contains("bucket") && msg.contains("not") {
                    return Err(BackendError::BucketNotFound(bucket.clone()));
                }
                return Err(e.into());
            }
        }
        drop(listing);

        debug!(endpoint = %endpoint, bucket = %bucket, "connected to S3 chunk storage");
        Ok(Self { inner: store })
    }

    fn partition_path(identifier: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", ROOT, URL_SAFE_NO_PAD.encode(identifier)))
    }

    fn chunk_path(identifier: &str, index: u64) -> ObjectPath {
        ObjectPath::from(format!(
            "{}/{}/{:020}",
            ROOT,
            URL_SAFE_NO_PAD.encode(identifier),
            index
        ))
    }

    async fn get_chunk(&self, identifier: &str, index: u64) -> Result<Option<Bytes>, BackendError> {
        let path = Self::chunk_path(identifier, index);
        match self.inner.get(&path).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Chunk indices stored for `identifier` within `[first, last]`, ascending.
    ///
    /// Taken from a listing of the partition prefix, so chunks beyond a hole
    /// are still found.
    async fn listed_indices(
        &self,
        identifier: &str,
        first: u64,
        last: Option<u64>,
    ) -> Result<VecDeque<u64>, BackendError> {
        let prefix = Self::partition_path(identifier);
        let locations: Vec<ObjectPath> = self
            .inner
            .list(Some(&prefix))
            .map_ok(|meta| meta.location)
            .try_collect()
            .await?;

        let mut indices = Vec::with_capacity(locations.len());
        for location in &locations {
            let index = location
                .filename()
                .and_then(|name| name.parse::<u64>().ok())
                .ok_or_else(|| BackendError::Corrupt(format!("unexpected chunk object {location}")))?;
            if index >= first && last.map_or(true, |last| index <= last) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        trace!(identifier, first, ?last, chunks = indices.len(), "listed chunk objects");
        Ok(indices.into())
    }

    async fn next_listed_row(
        &self,
        identifier: &str,
        first: u64,
        last: Option<u64>,
        pending: Option<VecDeque<u64>>,
    ) -> Result<Option<(ChunkRow, Option<VecDeque<u64>>)>, BackendError> {
        let mut pending = match pending {
            Some(pending) => pending,
            None => self.listed_indices(identifier, first, last).await?,
        };
        while let Some(index) = pending.pop_front() {
            match self.get_chunk(identifier, index).await? {
                Some(chunk) => {
                    trace!(identifier, chunk_index = index, "fetched chunk object");
                    return Ok(Some((ChunkRow { index, chunk }, Some(pending))));
                }
                // Purged between listing and fetch.
                None => trace!(identifier, chunk_index = index, "listed chunk object is gone"),
            }
        }
        Ok(None)
    }

    /// Stored chunks from `first` up to `last` (or the end), in index order.
    ///
    /// The prefix is listed on first poll and each chunk is fetched as the
    /// stream is consumed.
    fn rows(&self, identifier: &str, first: u64, last: Option<u64>) -> ChunkRowStream {
        let backend = self.clone();
        let identifier = identifier.to_string();

        Box::pin(stream::try_unfold(None::<VecDeque<u64>>, move |pending| {
            let backend = backend.clone();
            let identifier = identifier.clone();
            async move {
                backend
                    .next_listed_row(&identifier, first, last, pending)
                    .await
            }
        }))
    }
}

#[async_trait::async_trait]
impl ChunkBackend for ObjectBackend {
    async fn put_chunk(
        &self,
        identifier: &str,
        index: u64,
        chunk: Bytes,
        consistency: Consistency,
    ) -> Result<(), BackendError> {
        trace!(identifier, chunk_index = index, %consistency, "putting chunk object");
        let path = Self::chunk_path(identifier, index);
        self.inner.put(&path, chunk.into()).await?;
        Ok(())
    }

    async fn get_chunk0(
        &self,
        identifier: &str,
        consistency: Consistency,
    ) -> Result<bool, BackendError> {
        trace!(identifier, %consistency, "probing chunk 0");
        let path = Self::chunk_path(identifier, 0);
        match self.inner.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all_chunks(&self, identifier: &str, consistency: Consistency) -> ChunkRowStream {
        trace!(identifier, %consistency, "reading all chunk objects");
        self.rows(identifier, 0, None)
    }

    fn get_chunk_range(
        &self,
        identifier: &str,
        first: u64,
        last: u64,
        consistency: Consistency,
    ) -> ChunkRowStream {
        trace!(identifier, first, last, %consistency, "reading chunk object range");
        self.rows(identifier, first, Some(last))
    }

    async fn delete_all(&self, identifier: &str) -> Result<(), BackendError> {
        let prefix = Self::partition_path(identifier);
        let locations: Vec<ObjectPath> = self
            .inner
            .list(Some(&prefix))
            .map_ok(|meta| meta.location)
            .try_collect()
            .await?;

        for location in &locations {
            // Ignore NotFound errors - a concurrent purge may have won
            match self.inner.delete(location).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        trace!(identifier, objects = locations.len(), "deleted chunk objects");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const READ: Consistency = Consistency::default_read();
    const WRITE: Consistency = Consistency::default_write();

    async fn indices(stream: ChunkRowStream) -> Vec<u64> {
        stream.map_ok(|row| row.index).try_collect().await.unwrap()
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let backend = ObjectBackend::memory();
        let id = "http://example.com/binaries/1";

        assert!(!backend.get_chunk0(id, READ).await.unwrap());

        for (i, data) in [b"ab", b"cd", b"e_"].iter().enumerate() {
            backend
                .put_chunk(id, i as u64, Bytes::from_static(*data), WRITE)
                .await
                .unwrap();
        }

        assert!(backend.get_chunk0(id, READ).await.unwrap());
        assert_eq!(indices(backend.get_all_chunks(id, READ)).await, vec![0, 1, 2]);
        assert_eq!(
            indices(backend.get_chunk_range(id, 1, 2, READ)).await,
            vec![1, 2]
        );
        assert_eq!(
            indices(backend.get_chunk_range(id, 2, 8, READ)).await,
            vec![2]
        );

        backend.delete_all(id).await.unwrap();
        assert!(!backend.get_chunk0(id, READ).await.unwrap());
        assert!(indices(backend.get_all_chunks(id, READ)).await.is_empty());
    }

    #[tokio::test]
    async fn test_rows_continue_past_missing_chunk() {
        let backend = ObjectBackend::memory();
        let id = "sparse";
        for index in [0u64, 2, 3, 11] {
            backend
                .put_chunk(id, index, Bytes::from(index.to_string()), WRITE)
                .await
                .unwrap();
        }

        assert_eq!(
            indices(backend.get_all_chunks(id, READ)).await,
            vec![0, 2, 3, 11]
        );
        assert_eq!(
            indices(backend.get_chunk_range(id, 1, 3, READ)).await,
            vec![2, 3]
        );
        assert!(indices(backend.get_chunk_range(id, 4, 10, READ))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_identifiers_do_not_collide() {
        let backend = ObjectBackend::memory();
        backend
            .put_chunk("a/b", 0, Bytes::from_static(b"1"), WRITE)
            .await
            .unwrap();
        backend
            .put_chunk("a", 0, Bytes::from_static(b"2"), WRITE)
            .await
            .unwrap();

        backend.delete_all("a").await.unwrap();
        assert!(backend.get_chunk0("a/b", READ).await.unwrap());
        assert!(!backend.get_chunk0("a", READ).await.unwrap());
    }

    #[tokio::test]
    async fn test_local_backend() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = ObjectBackend::local(temp_dir.path()).await.unwrap();

        backend
            .put_chunk("id", 0, Bytes::from_static(b"test data"), WRITE)
            .await
            .unwrap();

        // Verify file exists on disk
        let file_path = temp_dir
            .path()
            .join(ROOT)
            .join(URL_SAFE_NO_PAD.encode("id"))
            .join(format!("{:020}", 0));
        assert!(file_path.exists());

        let rows: Vec<ChunkRow> = backend
            .get_all_chunks("id", READ)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].chunk, Bytes::from_static(b"test data"));
    }
}
