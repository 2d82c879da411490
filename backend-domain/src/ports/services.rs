use async_trait::async_trait;

use crate::entities::{Card, PriceQuote};
use crate::errors::PriceFetchError;

#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch_prices(&self, card: &Card) -> Result<PriceQuote, PriceFetchError>;
}

/// Hands the remaining price queue to a later run of the pipeline.
pub trait BatchContinuation: Send + Sync {
    /// Fire-and-forget. Requests made while one is already pending collapse into it.
    fn schedule_continuation(&self);
}
