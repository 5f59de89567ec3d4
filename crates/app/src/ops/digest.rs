use chunk_store::{BinaryService, BinaryStoreError};
use clap::Args;

use crate::op::OpContextError;

#[derive(Args, Debug, Clone)]
pub struct Digest {
    /// Identifier to hash
    pub id: String,

    /// Algorithm name (see `chunkvault algorithms`)
    #[arg(long, default_value = "SHA-256")]
    pub algorithm: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error(transparent)]
    Context(#[from] OpContextError),

    #[error("digest failed: {0}")]
    Store(#[from] BinaryStoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Digest {
    type Error = DigestError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.store().await?;
        Ok(store.digest(&self.id, &self.algorithm).await?)
    }
}
