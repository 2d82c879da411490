// Audit log entity
// Immutable record of one quantity mutation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::ChangeType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub stock_id: Uuid,
    pub owner_id: String,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub change_type: ChangeType,
    pub performed_by: String,
    /// Set when the mutation was one line of a sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}
