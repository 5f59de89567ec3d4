use chunk_store::BinaryService;
use clap::Args;

use crate::op::OpContextError;

#[derive(Args, Debug, Clone)]
pub struct NewId;

#[derive(Debug, thiserror::Error)]
pub enum NewIdError {
    #[error(transparent)]
    Context(#[from] OpContextError),
}

#[async_trait::async_trait]
impl crate::op::Op for NewId {
    type Error = NewIdError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let store = ctx.store().await?;
        Ok(store.generate_identifier())
    }
}
