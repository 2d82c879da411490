use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use backend_application::commands::notification_commands;
use backend_application::queries::notification_queries;
use backend_application::AppState;
use backend_domain::{MarkNotificationsRead, Notification, NotificationQuery};

use crate::error::HttpError;
use crate::middleware::{authorize, principal_from_headers};

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
    pub updated: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let principal = principal_from_headers(&headers);
    let rows = notification_queries::list_notifications(&state, &principal, query).await?;
    Ok(Json(rows))
}

pub async fn mark_notifications_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MarkNotificationsRead>,
) -> Result<Json<MarkReadResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let principal = principal_from_headers(&headers);
    let updated =
        notification_commands::mark_notifications_read(&state, &principal, payload.ids).await?;
    Ok(Json(MarkReadResponse {
        success: true,
        updated,
    }))
}
