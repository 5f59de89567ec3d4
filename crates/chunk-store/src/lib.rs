//! Chunked binary-object store.
//!
//! Binary content is split into fixed-length chunks, each stored as one row
//! keyed by `(identifier, chunk_index)` in a row-oriented backend (SQLite, or
//! one object per chunk in S3/MinIO/local filesystem/memory). Content is
//! streamed in and out chunk by chunk, so memory use stays bounded by the
//! chunk length regardless of object size.
//!
//! # Features
//!
//! - Whole and multi-range reads, reassembled lazily in caller order
//! - Configurable chunk length, overridable per write
//! - Client-side digests (MD2, MD5, SHA-1, SHA-256, SHA-384, SHA-512)
//! - Head-probe existence checks and whole-object purge
//!
//! # Example
//!
//! ```rust,no_run
//! use chunk_store::{collect_bytes, BinaryService, ChunkedBlobStore, WriteOptions};
//!
//! # async fn example() -> Result<(), chunk_store::BinaryStoreError> {
//! let store = ChunkedBlobStore::new_ephemeral().await?;
//! let id = store.generate_identifier();
//!
//! let mut data: &[u8] = b"hello chunks";
//! store.write(&id, &mut data, WriteOptions::default()).await?;
//!
//! let content = collect_bytes(store.read_all(&id).await?).await?;
//! assert_eq!(content.as_ref(), b"hello chunks");
//! # Ok(())
//! # }
//! ```

pub mod addressing;
pub mod backend;
pub mod digest;
mod error;
mod orchestrator;
pub mod reader;
mod store;
mod stream;
#[cfg(test)]
mod testing;
pub mod writer;

pub use addressing::{ByteRange, ChunkLength, DEFAULT_CHUNK_LENGTH};
pub use backend::{BackendConfig, ChunkBackend, Consistency, S3Config};
pub use digest::DigestAlgorithm;
pub use error::{BackendError, BinaryStoreError, Result};
pub use store::{
    Binary, BinaryService, ChunkedBlobStore, StoreConfig, WriteOptions, CHUNK_LENGTH_HINT,
};
pub use stream::{collect_bytes, copy_to, BinaryStream};
pub use writer::WriteSummary;
