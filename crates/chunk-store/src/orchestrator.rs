//! Glue between the pipelines and the backend.
//!
//! Backend futures and row streams are translated into the store's error
//! taxonomy here, and concurrently fetched pieces are put back in order.
//! Nothing is spawned: every future runs on the caller's task, so dropping an
//! operation cancels whatever backend requests it still has in flight.

use std::future::Future;

use futures::future::try_join_all;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use tracing::warn;

use crate::backend::{ChunkRow, ChunkRowStream};
use crate::error::{BackendError, BinaryStoreError, Result};
use crate::stream::BinaryStream;

/// Await a backend future, wrapping its failure as a storage failure.
pub(crate) async fn translate<T, F>(operation: &'static str, identifier: &str, request: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, BackendError>>,
{
    request
        .await
        .map_err(|source| storage_failure(operation, identifier, source))
}

/// Wrap the failures of a backend row stream as storage failures.
pub(crate) fn translate_rows(
    operation: &'static str,
    identifier: &str,
    rows: ChunkRowStream,
) -> BoxStream<'static, Result<ChunkRow>> {
    let identifier = identifier.to_string();
    rows.map_err(move |source| storage_failure(operation, &identifier, source))
        .boxed()
}

fn storage_failure(operation: &'static str, identifier: &str, source: BackendError) -> BinaryStoreError {
    warn!(operation, identifier, error = %source, "storage request failed");
    BinaryStoreError::Storage { operation, source }
}

/// Resolve `parts` concurrently and concatenate their streams in the order given.
///
/// Completion order of the underlying requests does not matter; the output
/// always follows the order of `parts`. The first failure cancels the rest.
pub(crate) async fn ordered_concat<I, F>(parts: I) -> Result<BinaryStream>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<BinaryStream>>,
{
    let streams = try_join_all(parts).await?;
    Ok(stream::iter(streams).flatten().boxed())
}
