// Stock entity
// One row of inventory for a (card, condition, language, owner) combination

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::AuditLogEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub core_card_id: Option<Uuid>,
    pub quantity: i32,
    pub condition: Option<String>,
    pub language: Option<String>,
    pub sku: Option<String>,
    pub location: Option<String>,
    pub cost_basis: Option<Decimal>,
    pub is_active: bool,
    /// Bumped on every ledger write; writes carry the version they were planned against.
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    pub fn label(&self) -> String {
        self.sku.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Optional column edits that ride along with a quantity mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockFieldUpdates {
    pub condition: Option<String>,
    pub language: Option<String>,
    pub sku: Option<String>,
    pub location: Option<String>,
    pub cost_basis: Option<Decimal>,
}

impl StockFieldUpdates {
    pub fn is_empty(&self) -> bool {
        self.condition.is_none()
            && self.language.is_none()
            && self.sku.is_none()
            && self.location.is_none()
            && self.cost_basis.is_none()
    }

    pub fn apply_to(&self, stock: &mut StockRecord) {
        if let Some(condition) = &self.condition {
            stock.condition = Some(condition.clone());
        }
        if let Some(language) = &self.language {
            stock.language = Some(language.clone());
        }
        if let Some(sku) = &self.sku {
            stock.sku = Some(sku.clone());
        }
        if let Some(location) = &self.location {
            stock.location = Some(location.clone());
        }
        if let Some(cost) = self.cost_basis {
            stock.cost_basis = Some(cost);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityChange {
    Delta(i32),
    Absolute(i32),
    Unchanged,
}

/// The row state a ledger write installs, guarded by `expected_version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockWrite {
    pub stock_id: Uuid,
    pub expected_version: i64,
    pub quantity: i32,
    pub is_active: bool,
    pub fields: StockFieldUpdates,
    pub updated_at: DateTime<Utc>,
}

/// A stock row update and its audit entry. Stores commit both or neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerWrite {
    pub stock: StockWrite,
    pub audit: AuditLogEntry,
}
