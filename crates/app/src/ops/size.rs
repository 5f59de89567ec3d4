use chunk_store::BinaryStoreError;
use clap::Args;

use crate::op::OpContextError;

/// Reads every chunk to count the bytes; the length is not stored.
#[derive(Args, Debug, Clone)]
pub struct Size {
    /// Identifier to measure
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SizeError {
    #[error(transparent)]
    Context(#[from] OpContextError),

    #[error("size failed: {0}")]
    Store(#[from] BinaryStoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Size {
    type Error = SizeError;
    type Output = u64;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.store().await?;
        Ok(store.size(&self.id).await?)
    }
}
