//! Error types for the chunk store.

/// Errors raised by a [`ChunkBackend`](crate::backend::ChunkBackend).
///
/// These never reach callers of the store directly; the orchestrator wraps
/// them into [`BinaryStoreError::Storage`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// S3 bucket not found - must be created before use
    #[error("S3 bucket '{0}' does not exist. Create it before opening the store.")]
    BucketNotFound(String),

    /// A stored row could not be interpreted
    #[error("corrupt chunk row: {0}")]
    Corrupt(String),
}

/// Errors surfaced by the public store operations.
#[derive(Debug, thiserror::Error)]
pub enum BinaryStoreError {
    /// Caller supplied an invalid argument; raised before any I/O.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// No chunks exist for the identifier.
    #[error("no data for identifier: {0}")]
    MissingObject(String),

    /// The object exists but a chunk in the middle of the requested span is absent.
    #[error("chunk {index} of {identifier} is missing")]
    MissingChunk { identifier: String, index: u64 },

    /// Digest requested for an algorithm outside the supported set.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The backend failed while executing a request.
    #[error("storage failure during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: BackendError,
    },

    /// Reading the caller's input or writing the caller's output failed.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BinaryStoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        BinaryStoreError::Validation(msg.into())
    }

    /// True when the error means the identifier holds no data.
    pub fn is_missing(&self) -> bool {
        matches!(self, BinaryStoreError::MissingObject(_))
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, BinaryStoreError>;
