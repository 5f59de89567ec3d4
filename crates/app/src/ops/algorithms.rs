use std::convert::Infallible;

use chunk_store::DigestAlgorithm;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Algorithms;

#[async_trait::async_trait]
impl crate::op::Op for Algorithms {
    type Error = Infallible;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        Ok(DigestAlgorithm::supported().join("\n"))
    }
}
