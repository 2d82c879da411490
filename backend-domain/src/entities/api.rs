// Wire payloads for the HTTP operations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{DiscrepancyDetail, Transaction, TransactionItem};

#[derive(Debug, Clone, Deserialize)]
pub struct StockUpdateRequest {
    pub stock_id: Uuid,
    pub change_type: String,
    #[serde(default)]
    pub quantity_change: Option<i32>,
    #[serde(default)]
    pub quantity_new: Option<i32>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub marketplace: Option<String>,
    #[serde(default)]
    pub performed_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockUpdateResponse {
    pub success: bool,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub discrepancy: bool,
    pub quantity_clamped: bool,
    pub marketplaces_listed: Vec<String>,
    pub stock_audit_id: Uuid,
    pub notifications_created: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleItemRequest {
    pub stock_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StockTransactionRequest {
    pub change_type: String,
    #[serde(default)]
    pub performed_by: Option<String>,
    #[serde(default)]
    pub marketplace: Option<String>,
    #[serde(default)]
    pub tax_amount: Option<Decimal>,
    #[serde(default)]
    pub shipping_amount: Option<Decimal>,
    #[serde(default)]
    pub net_amount: Option<Decimal>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub items: Vec<SaleItemRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockTransactionResponse {
    pub success: bool,
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
    pub discrepancy: bool,
    pub discrepancy_details: Vec<DiscrepancyDetail>,
    pub replayed: bool,
    pub notifications_created: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceUpdateRequest {
    #[serde(default)]
    pub auto_invoked: bool,
    #[serde(default)]
    pub batch_continue: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceUpdateResponse {
    pub success: bool,
    pub processed: usize,
    pub failed: usize,
    pub remaining: u64,
    pub execution_ms: u64,
    pub will_continue: bool,
}
