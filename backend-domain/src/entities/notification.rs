// Notification entity
// Per-user alert rows written by the discrepancy checker and the price pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::NotificationType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_card_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub message: String,
    pub metadata: serde_json::Value,
    pub is_read: bool,
    /// Rows sharing a key are written once; see `utils::notification_dedupe_key`.
    #[serde(skip)]
    pub dedupe_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MarkNotificationsRead {
    pub ids: Vec<Uuid>,
}
