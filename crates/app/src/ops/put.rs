use std::path::PathBuf;

use chunk_store::{BinaryService, BinaryStoreError, ChunkLength, WriteOptions};
use clap::Args;
use tokio::io::AsyncRead;

use crate::op::OpContextError;

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// File to store ("-" reads stdin)
    pub file: PathBuf,

    /// Identifier to store under (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Chunk length for this write only
    #[arg(long)]
    pub chunk_length: Option<ChunkLength>,
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error(transparent)]
    Context(#[from] OpContextError),

    #[error("failed to open {0}: {1}")]
    Open(PathBuf, std::io::Error),

    #[error("put failed: {0}")]
    Store(#[from] BinaryStoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Put {
    type Error = PutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.store().await?;
        let identifier = self
            .id
            .clone()
            .unwrap_or_else(|| store.generate_identifier());

        let mut reader: Box<dyn AsyncRead + Send + Unpin> = if self.file.as_os_str() == "-" {
            Box::new(tokio::io::stdin())
        } else {
            let file = tokio::fs::File::open(&self.file)
                .await
                .map_err(|e| PutError::Open(self.file.clone(), e))?;
            Box::new(file)
        };

        let options = WriteOptions {
            chunk_length: self.chunk_length,
        };
        let summary = store.write(&identifier, &mut *reader, options).await?;

        Ok(format!(
            "{}\n - chunks: {}\n - bytes: {}",
            identifier, summary.chunks, summary.bytes
        ))
    }
}
