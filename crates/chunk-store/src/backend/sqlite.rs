//! SQLite chunk rows.

use std::path::Path;

use bytes::Bytes;
use futures::stream;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    Row,
};
use tracing::trace;

use super::{ChunkBackend, ChunkRow, ChunkRowStream, Consistency};
use crate::error::BackendError;

const INSERT_QUERY: &str = r#"
    INSERT INTO binary_data (identifier, chunk_index, chunk)
    VALUES (?, ?, ?)
    ON CONFLICT(identifier, chunk_index) DO UPDATE SET
        chunk = excluded.chunk
"#;

const CONTAINS_QUERY: &str = r#"
    SELECT 1 FROM binary_data WHERE identifier = ? AND chunk_index = 0
"#;

// Both reads page through the partition one row at a time so that no more
// than one chunk is held per open stream.
const READ_QUERY: &str = r#"
    SELECT chunk_index, chunk FROM binary_data
    WHERE identifier = ? AND chunk_index >= ?
    ORDER BY chunk_index
    LIMIT 1
"#;

const READ_RANGE_QUERY: &str = r#"
    SELECT chunk_index, chunk FROM binary_data
    WHERE identifier = ? AND chunk_index >= ? AND chunk_index <= ?
    ORDER BY chunk_index
    LIMIT 1
"#;

const DELETE_QUERY: &str = r#"
    DELETE FROM binary_data WHERE identifier = ?
"#;

/// Chunk rows in a SQLite table keyed by `(identifier, chunk_index)`.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (or create) a database file.
    pub async fn new(path: &Path) -> Result<Self, BackendError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let backend = Self { pool };
        backend.run_migrations().await?;
        Ok(backend)
    }

    /// Create an in-memory database.
    pub async fn in_memory() -> Result<Self, BackendError> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .journal_mode(SqliteJournalMode::Wal);

        // Every connection to ":memory:" is its own database, so stay on one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let backend = Self { pool };
        backend.run_migrations().await?;
        Ok(backend)
    }

    async fn run_migrations(&self) -> Result<(), BackendError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Stream rows of `identifier` from `first` up to `last` (unbounded when `None`).
    fn rows(&self, identifier: &str, first: u64, last: Option<u64>) -> ChunkRowStream {
        let pool = self.pool.clone();
        let identifier = identifier.to_string();

        Box::pin(stream::try_unfold(Some(first), move |cursor| {
            let pool = pool.clone();
            let identifier = identifier.clone();
            async move {
                match cursor {
                    Some(cursor) => fetch_next(&pool, &identifier, cursor, last).await,
                    None => Ok(None),
                }
            }
        }))
    }
}

/// Fetch the first row at or after `cursor`, paired with the next cursor.
async fn fetch_next(
    pool: &SqlitePool,
    identifier: &str,
    cursor: u64,
    last: Option<u64>,
) -> Result<Option<(ChunkRow, Option<u64>)>, BackendError> {
    if last.is_some_and(|last| cursor > last) {
        return Ok(None);
    }

    let query = match last {
        Some(last) => sqlx::query(READ_RANGE_QUERY)
            .bind(identifier)
            .bind(to_row_index(cursor)?)
            .bind(to_row_index(last)?),
        None => sqlx::query(READ_QUERY)
            .bind(identifier)
            .bind(to_row_index(cursor)?),
    };
    let Some(row) = query.fetch_optional(pool).await? else {
        return Ok(None);
    };

    let index = from_row_index(row.get("chunk_index"))?;
    let chunk: Vec<u8> = row.get("chunk");
    trace!(identifier, chunk_index = index, bytes = chunk.len(), "fetched chunk row");

    let row = ChunkRow {
        index,
        chunk: Bytes::from(chunk),
    };
    Ok(Some((row, index.checked_add(1))))
}

fn to_row_index(index: u64) -> Result<i64, BackendError> {
    i64::try_from(index)
        .map_err(|_| BackendError::Corrupt(format!("chunk index {index} out of range")))
}

fn from_row_index(index: i64) -> Result<u64, BackendError> {
    u64::try_from(index).map_err(|_| BackendError::Corrupt(format!("negative chunk index {index}")))
}

#[async_trait::async_trait]
impl ChunkBackend for SqliteBackend {
    async fn put_chunk(
        &self,
        identifier: &str,
        index: u64,
        chunk: Bytes,
        consistency: Consistency,
    ) -> Result<(), BackendError> {
        trace!(identifier, chunk_index = index, %consistency, "inserting chunk row");
        sqlx::query(INSERT_QUERY)
            .bind(identifier)
            .bind(to_row_index(index)?)
            .bind(chunk.as_ref())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_chunk0(
        &self,
        identifier: &str,
        consistency: Consistency,
    ) -> Result<bool, BackendError> {
        trace!(identifier, %consistency, "probing chunk 0");
        let row = sqlx::query(CONTAINS_QUERY)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    fn get_all_chunks(&self, identifier: &str, consistency: Consistency) -> ChunkRowStream {
        trace!(identifier, %consistency, "reading all chunk rows");
        self.rows(identifier, 0, None)
    }

    fn get_chunk_range(
        &self,
        identifier: &str,
        first: u64,
        last: u64,
        consistency: Consistency,
    ) -> ChunkRowStream {
        trace!(identifier, first, last, %consistency, "reading chunk row range");
        self.rows(identifier, first, Some(last))
    }

    async fn delete_all(&self, identifier: &str) -> Result<(), BackendError> {
        let result = sqlx::query(DELETE_QUERY)
            .bind(identifier)
            .execute(&self.pool)
            .await?;
        trace!(identifier, rows = result.rows_affected(), "deleted chunk rows");
        Ok(())
    }
}

#[cfg(test)]
impl SqliteBackend {
    /// Count the stored chunks of one identifier.
    pub async fn count_chunks(&self, identifier: &str) -> Result<i64, BackendError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM binary_data WHERE identifier = ?
            "#,
        )
        .bind(identifier)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("count"))
    }
}
