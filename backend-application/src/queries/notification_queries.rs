use tracing::error;

use crate::AppError;
use crate::AppState;
use backend_domain::{Notification, NotificationQuery, Principal};

const DEFAULT_NOTIFICATION_LIMIT: usize = 50;
const MAX_NOTIFICATION_LIMIT: usize = 200;

pub(crate) fn require_user(principal: &Principal) -> Result<&str, AppError> {
    principal
        .user_id()
        .ok_or_else(|| AppError::Validation("X-User-Id header is required".to_string()))
}

pub async fn list_notifications(
    state: &AppState,
    principal: &Principal,
    query: NotificationQuery,
) -> Result<Vec<Notification>, AppError> {
    let user_id = require_user(principal)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT);
    let rows = state
        .notification_repo
        .list_notifications(user_id, query.unread_only, limit)
        .await
        .map_err(|err| {
            error!("failed to fetch notifications: {}", err);
            AppError::Internal(err)
        })?;
    Ok(rows)
}
