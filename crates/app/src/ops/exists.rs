use chunk_store::{BinaryService, BinaryStoreError};
use clap::Args;

use crate::op::OpContextError;

#[derive(Args, Debug, Clone)]
pub struct Exists {
    /// Identifier to probe
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExistsError {
    #[error(transparent)]
    Context(#[from] OpContextError),

    #[error("exists failed: {0}")]
    Store(#[from] BinaryStoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Exists {
    type Error = ExistsError;
    type Output = bool;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.store().await?;
        Ok(store.exists(&self.id).await?)
    }
}
