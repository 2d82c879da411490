// Transaction entities
// A commercial event and its line items; never mutated after creation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::LedgerWrite;

pub const IN_STORE_SOURCE: &str = "in-store";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Sale,
    Purchase,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Purchase => "purchase",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TransactionType::Sale),
            "purchase" => Ok(TransactionType::Purchase),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Marketplace identifier, or `in-store`.
    pub source: String,
    pub is_integration: bool,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub net_amount: Decimal,
    pub performed_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub stock_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Everything a sale writes, committed as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleCommit {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
    pub writes: Vec<LedgerWrite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyDetail {
    pub stock_id: Uuid,
    pub quantity_requested: i32,
    pub quantity_before: i32,
    pub quantity_after: i32,
    /// The sale asked for more units than the row held.
    pub quantity_clamped: bool,
    pub other_marketplaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_error: Option<String>,
}
