use backend_domain::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    /// Rejected input; nothing was written.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Duplicate(String),
    /// The row moved underneath the request; the caller may retry.
    #[error("{0}")]
    ConcurrentModification(String),
    #[error("{0}")]
    ExternalService(String),
    #[error("{0}")]
    Integrity(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Duplicate(_) => "duplicate",
            AppError::ConcurrentModification(_) => "concurrent_modification",
            AppError::ExternalService(_) => "external_service_error",
            AppError::Integrity(_) => "integrity_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => AppError::NotFound(format!("stock {} not found", id)),
            StoreError::Duplicate(msg) => AppError::Duplicate(msg),
            err @ StoreError::ConcurrentModification { .. } => {
                AppError::ConcurrentModification(err.to_string())
            }
            StoreError::Other(err) => AppError::Internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn store_conflict_maps_to_concurrent_modification() {
        let err: AppError = StoreError::ConcurrentModification {
            stock_id: Uuid::nil(),
            expected: 3,
        }
        .into();
        assert_eq!(err.code(), "concurrent_modification");
    }

    #[test]
    fn store_duplicate_keeps_message() {
        let err: AppError = StoreError::Duplicate("idempotency key reused".to_string()).into();
        assert!(matches!(err, AppError::Duplicate(ref msg) if msg == "idempotency key reused"));
    }
}
