use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use backend_application::AppError;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest(String),
    NotFound(String),
    /// A business-level refusal: HTTP 200 with `success: false`.
    Rejected { code: &'static str, message: String },
    BadGateway(String),
    Internal { code: &'static str, message: String },
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        let code = value.code();
        match value {
            AppError::Unauthorized => HttpError::Unauthorized,
            AppError::Validation(msg) => HttpError::BadRequest(msg),
            AppError::NotFound(msg) => HttpError::NotFound(msg),
            AppError::Duplicate(message) | AppError::ConcurrentModification(message) => {
                HttpError::Rejected { code, message }
            }
            AppError::ExternalService(msg) => HttpError::BadGateway(msg),
            AppError::Integrity(message) => HttpError::Internal { code, message },
            AppError::Internal(err) => HttpError::Internal {
                code,
                message: err.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            HttpError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "unauthorized".to_string(),
            ),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            HttpError::Rejected { code, message } => (StatusCode::OK, code, message),
            HttpError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "external_service_error", msg),
            HttpError::Internal { code, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, code, message)
            }
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_conflicts_stay_200() {
        let response =
            HttpError::from(AppError::ConcurrentModification("stale".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = HttpError::from(AppError::Duplicate("exists".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn status_codes_follow_error_class() {
        let cases = [
            (AppError::Validation("x".to_string()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::ExternalService("x".to_string()), StatusCode::BAD_GATEWAY),
            (AppError::Integrity("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(HttpError::from(err).into_response().status(), status);
        }
    }
}
