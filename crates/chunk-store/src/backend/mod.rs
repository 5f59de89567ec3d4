//! Narrow interface to the row store holding chunk rows.
//!
//! Rows are keyed by `(identifier, chunk_index)`: the identifier partitions
//! the rows of one binary and the index orders them. Everything above this
//! module only talks to [`ChunkBackend`], so an alternative store can be
//! swapped in without touching the pipelines.

mod object;
mod sqlite;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

pub use object::{ObjectBackend, S3Config};
pub use sqlite::SqliteBackend;

/// One stored chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRow {
    pub index: u64,
    pub chunk: Bytes,
}

/// Lazily fetched rows, ascending by index.
pub type ChunkRowStream = BoxStream<'static, Result<ChunkRow, BackendError>>;

/// Per-request consistency level.
///
/// Replicated stores use it to trade latency for durability and visibility.
/// Single-node adapters accept it and ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Consistency {
    One,
    LocalOne,
    Quorum,
    LocalQuorum,
    All,
}

impl Consistency {
    /// Default for reads and existence probes: tolerates one lagging replica.
    pub const fn default_read() -> Self {
        Consistency::LocalOne
    }

    /// Default for writes: requires a local quorum.
    pub const fn default_write() -> Self {
        Consistency::LocalQuorum
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Consistency::One => "ONE",
            Consistency::LocalOne => "LOCAL_ONE",
            Consistency::Quorum => "QUORUM",
            Consistency::LocalQuorum => "LOCAL_QUORUM",
            Consistency::All => "ALL",
        }
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store holding chunk rows.
#[async_trait::async_trait]
pub trait ChunkBackend: Send + Sync + fmt::Debug {
    /// Upsert one chunk row.
    async fn put_chunk(
        &self,
        identifier: &str,
        index: u64,
        chunk: Bytes,
        consistency: Consistency,
    ) -> Result<(), BackendError>;

    /// Whether chunk 0 exists for `identifier`.
    async fn get_chunk0(&self, identifier: &str, consistency: Consistency)
        -> Result<bool, BackendError>;

    /// Every chunk of `identifier`, ascending by index.
    fn get_all_chunks(&self, identifier: &str, consistency: Consistency) -> ChunkRowStream;

    /// Chunks of `identifier` with `first <= index <= last`, ascending by index.
    fn get_chunk_range(
        &self,
        identifier: &str,
        first: u64,
        last: u64,
        consistency: Consistency,
    ) -> ChunkRowStream;

    /// Remove every chunk of `identifier`. Succeeds when nothing is stored.
    async fn delete_all(&self, identifier: &str) -> Result<(), BackendError>;
}

/// Which backend to open and where its data lives.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-memory SQLite (for testing)
    #[default]
    Memory,

    /// SQLite database file
    Sqlite {
        /// Path to the database file
        path: PathBuf,
    },

    /// One object per chunk on the local filesystem
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// One object per chunk in S3-compatible storage (AWS S3, MinIO, etc.)
    S3(S3Config),
}

impl BackendConfig {
    /// Open the configured backend.
    pub async fn open(&self) -> Result<Arc<dyn ChunkBackend>, BackendError> {
        let backend: Arc<dyn ChunkBackend> = match self {
            BackendConfig::Memory => Arc::new(SqliteBackend::in_memory().await?),
            BackendConfig::Sqlite { path } => Arc::new(SqliteBackend::new(path).await?),
            BackendConfig::Local { path } => Arc::new(ObjectBackend::local(path).await?),
            BackendConfig::S3(config) => Arc::new(ObjectBackend::s3(config).await?),
        };
        Ok(backend)
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Memory => "memory",
            BackendConfig::Sqlite { .. } => "sqlite",
            BackendConfig::Local { .. } => "local",
            BackendConfig::S3(_) => "s3",
        }
    }
}
