use std::path::PathBuf;

use chunk_store::{copy_to, BinaryService, BinaryStoreError, ByteRange, ChunkLength};
use clap::Args;

use crate::op::OpContextError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Identifier to read
    pub id: String,

    /// Inclusive byte range `start-end`; repeat for several, output follows the given order
    #[arg(long = "range")]
    pub ranges: Vec<ByteRange>,

    /// Chunk length the content was written with, when `put --chunk-length` overrode it
    #[arg(long)]
    pub chunk_length: Option<ChunkLength>,

    /// Write to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error(transparent)]
    Context(#[from] OpContextError),

    #[error("failed to create {0}: {1}")]
    Create(PathBuf, std::io::Error),

    #[error("get failed: {0}")]
    Store(#[from] BinaryStoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.store().await?;
        let stream = match self.chunk_length {
            Some(chunk_length) => {
                store
                    .get(&self.id)
                    .await?
                    .with_chunk_length(chunk_length)
                    .content_ranges(&self.ranges)
                    .await?
            }
            None => store.read_ranges(&self.id, &self.ranges).await?,
        };

        match &self.out {
            Some(path) => {
                let mut file = tokio::fs::File::create(path)
                    .await
                    .map_err(|e| GetError::Create(path.clone(), e))?;
                let written = copy_to(stream, &mut file).await?;
                Ok(format!("wrote {} bytes to {}", written, path.display()))
            }
            None => {
                // Content goes to stdout as is; nothing else is printed.
                copy_to(stream, &mut tokio::io::stdout()).await?;
                Ok(String::new())
            }
        }
    }
}
