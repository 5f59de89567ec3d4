use chunk_store::{BinaryService, BinaryStoreError};
use clap::Args;

use crate::op::OpContextError;

#[derive(Args, Debug, Clone)]
pub struct Purge {
    /// Identifier to delete
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    #[error(transparent)]
    Context(#[from] OpContextError),

    #[error("purge failed: {0}")]
    Store(#[from] BinaryStoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Purge {
    type Error = PurgeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.store().await?;
        store.purge(&self.id).await?;
        Ok(format!("purged {}", self.id))
    }
}
