// Errors that cross the port boundary and that callers branch on

use thiserror::Error;
use uuid::Uuid;

use crate::value_objects::ExternalSource;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stock {0} not found")]
    NotFound(Uuid),
    #[error("duplicate record: {0}")]
    Duplicate(String),
    #[error("stock {stock_id} was modified concurrently (expected version {expected})")]
    ConcurrentModification { stock_id: Uuid, expected: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum PriceFetchError {
    #[error("price source '{0}' is not implemented")]
    NotImplemented(ExternalSource),
    #[error("card {0} has no external id for its price source")]
    MissingExternalId(Uuid),
    #[error("card not found at {provider}: {external_id}")]
    CardNotFound { provider: String, external_id: String },
    #[error("rate limited by {0}")]
    RateLimited(String),
    #[error("timeout talking to {0}")]
    Timeout(String),
    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },
}
