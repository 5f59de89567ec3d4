//! ChunkedBlobStore - binary content stored as fixed-length chunk rows.
//!
//! The store owns no state besides a backend handle and its configuration.
//! Writes are split into chunks by [`crate::writer`], reads are reassembled
//! by [`crate::reader`], and every backend call goes through
//! [`crate::orchestrator`] so failures surface as [`BinaryStoreError`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;
use tracing::{debug, info};
use uuid::Uuid;

use crate::addressing::{ByteRange, ChunkLength};
use crate::backend::{BackendConfig, ChunkBackend, Consistency};
use crate::digest::{digest_stream, DigestAlgorithm};
use crate::error::{BinaryStoreError, Result};
use crate::orchestrator::translate;
use crate::reader::{read_all, read_ranges};
use crate::stream::BinaryStream;
use crate::writer::{write_chunks, WriteSummary};

/// Hint key overriding the chunk length of a single write.
pub const CHUNK_LENGTH_HINT: &str = "Chunk-Length";

const DEFAULT_IDENTIFIER_PREFIX: &str = "chunkvault:data/";

/// Store-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Chunk length for writes without a hint, and for all range reads.
    pub chunk_length: ChunkLength,
    pub read_consistency: Consistency,
    pub write_consistency: Consistency,
    /// Prepended to generated identifiers.
    pub identifier_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_length: ChunkLength::default(),
            read_consistency: Consistency::default_read(),
            write_consistency: Consistency::default_write(),
            identifier_prefix: DEFAULT_IDENTIFIER_PREFIX.to_string(),
        }
    }
}

/// Per-write overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub chunk_length: Option<ChunkLength>,
}

impl WriteOptions {
    pub fn with_chunk_length(chunk_length: ChunkLength) -> Self {
        Self {
            chunk_length: Some(chunk_length),
        }
    }

    /// Build options from out-of-band hints.
    ///
    /// Only [`CHUNK_LENGTH_HINT`] is understood; its first value must parse as
    /// a positive integer. Other keys are ignored.
    pub fn from_hints(hints: &HashMap<String, Vec<String>>) -> Result<Self> {
        let chunk_length = hints
            .get(CHUNK_LENGTH_HINT)
            .and_then(|values| values.first())
            .map(|value| value.parse::<ChunkLength>())
            .transpose()?;
        Ok(Self { chunk_length })
    }
}

/// The operations offered over chunked binary content.
#[async_trait::async_trait]
pub trait BinaryService: Send + Sync {
    /// Persist `reader` under `identifier`, chunk by chunk.
    async fn write(
        &self,
        identifier: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        options: WriteOptions,
    ) -> Result<WriteSummary>;

    /// The whole content of `identifier`.
    async fn read_all(&self, identifier: &str) -> Result<BinaryStream>;

    /// The bytes of each range, concatenated in the order given.
    async fn read_ranges(&self, identifier: &str, ranges: &[ByteRange]) -> Result<BinaryStream>;

    /// Base64 digest of the content of `identifier`.
    async fn digest(&self, identifier: &str, algorithm: &str) -> Result<String>;

    /// Whether `identifier` holds content. Only chunk 0 is probed.
    async fn exists(&self, identifier: &str) -> Result<bool>;

    /// Remove every chunk of `identifier`.
    async fn purge(&self, identifier: &str) -> Result<()>;

    fn supported_algorithms(&self) -> Vec<&'static str>;

    fn generate_identifier(&self) -> String;
}

/// Handle on stored content, resolved by [`ChunkedBlobStore::get`].
#[derive(Debug, Clone)]
pub struct Binary {
    identifier: String,
    chunk_length: ChunkLength,
    consistency: Consistency,
    backend: Arc<dyn ChunkBackend>,
}

impl Binary {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn chunk_length(&self) -> ChunkLength {
        self.chunk_length
    }

    /// Use a different chunk length for range math, for content written with
    /// a per-write override.
    pub fn with_chunk_length(mut self, chunk_length: ChunkLength) -> Self {
        self.chunk_length = chunk_length;
        self
    }

    /// The whole content.
    pub async fn content(&self) -> Result<BinaryStream> {
        read_all(self.backend.as_ref(), &self.identifier, self.consistency).await
    }

    /// Bytes `from..=to` of the content.
    pub async fn content_range(&self, from: u64, to: u64) -> Result<BinaryStream> {
        let range = ByteRange::new(from, to)?;
        self.content_ranges(&[range]).await
    }

    /// The given ranges in order, located with this handle's chunk length.
    /// No ranges means the whole content.
    pub async fn content_ranges(&self, ranges: &[ByteRange]) -> Result<BinaryStream> {
        read_ranges(
            self.backend.as_ref(),
            &self.identifier,
            ranges,
            self.chunk_length,
            self.consistency,
        )
        .await
    }
}

/// Chunked binary store over any [`ChunkBackend`].
#[derive(Debug, Clone)]
pub struct ChunkedBlobStore {
    backend: Arc<dyn ChunkBackend>,
    config: StoreConfig,
}

impl ChunkedBlobStore {
    pub fn new(backend: Arc<dyn ChunkBackend>, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    /// Open the configured backend and wrap it.
    pub async fn open(backend: &BackendConfig, config: StoreConfig) -> Result<Self> {
        let opened = translate("open", backend.kind(), backend.open()).await?;
        info!(
            backend = backend.kind(),
            chunk_length = %config.chunk_length,
            "chunk store opened"
        );
        Ok(Self::new(opened, config))
    }

    /// Fully ephemeral store (in-memory SQLite, default settings).
    pub async fn new_ephemeral() -> Result<Self> {
        Self::open(&BackendConfig::Memory, StoreConfig::default()).await
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Resolve a handle on existing content.
    pub async fn get(&self, identifier: &str) -> Result<Binary> {
        if !self.exists(identifier).await? {
            return Err(BinaryStoreError::MissingObject(identifier.to_string()));
        }
        Ok(Binary {
            identifier: identifier.to_string(),
            chunk_length: self.config.chunk_length,
            consistency: self.config.read_consistency,
            backend: Arc::clone(&self.backend),
        })
    }

    /// Length of the content in bytes. Reads every chunk.
    pub async fn size(&self, identifier: &str) -> Result<u64> {
        use futures::TryStreamExt;

        let stream = BinaryService::read_all(self, identifier).await?;
        stream
            .try_fold(0u64, |size, chunk| async move { Ok(size + chunk.len() as u64) })
            .await
    }
}

fn check_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(BinaryStoreError::validation("identifier must not be empty"));
    }
    Ok(())
}

#[async_trait::async_trait]
impl BinaryService for ChunkedBlobStore {
    async fn write(
        &self,
        identifier: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        options: WriteOptions,
    ) -> Result<WriteSummary> {
        check_identifier(identifier)?;
        let chunk_length = options.chunk_length.unwrap_or(self.config.chunk_length);

        let summary = write_chunks(
            self.backend.as_ref(),
            identifier,
            reader,
            chunk_length,
            self.config.write_consistency,
        )
        .await?;

        info!(
            identifier,
            chunks = summary.chunks,
            bytes = summary.bytes,
            chunk_length = %chunk_length,
            "binary stored"
        );
        Ok(summary)
    }

    async fn read_all(&self, identifier: &str) -> Result<BinaryStream> {
        check_identifier(identifier)?;
        read_all(self.backend.as_ref(), identifier, self.config.read_consistency).await
    }

    async fn read_ranges(&self, identifier: &str, ranges: &[ByteRange]) -> Result<BinaryStream> {
        check_identifier(identifier)?;
        read_ranges(
            self.backend.as_ref(),
            identifier,
            ranges,
            self.config.chunk_length,
            self.config.read_consistency,
        )
        .await
    }

    async fn digest(&self, identifier: &str, algorithm: &str) -> Result<String> {
        check_identifier(identifier)?;
        let algorithm: DigestAlgorithm = algorithm.parse()?;

        let stream = BinaryService::read_all(self, identifier).await?;
        let digest = digest_stream(algorithm, stream).await?;
        debug!(identifier, %algorithm, "computed digest");
        Ok(digest)
    }

    async fn exists(&self, identifier: &str) -> Result<bool> {
        check_identifier(identifier)?;
        translate(
            "exists",
            identifier,
            self.backend
                .get_chunk0(identifier, self.config.read_consistency),
        )
        .await
    }

    async fn purge(&self, identifier: &str) -> Result<()> {
        check_identifier(identifier)?;
        translate("purge", identifier, self.backend.delete_all(identifier)).await?;
        info!(identifier, "binary purged");
        Ok(())
    }

    fn supported_algorithms(&self) -> Vec<&'static str> {
        DigestAlgorithm::supported()
    }

    fn generate_identifier(&self) -> String {
        format!("{}{}", self.config.identifier_prefix, Uuid::new_v4())
    }
}
