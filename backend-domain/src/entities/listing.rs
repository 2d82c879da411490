// Marketplace listing entity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceListing {
    pub stock_id: Uuid,
    pub marketplace_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyCheck {
    pub other_marketplaces: Vec<String>,
    pub discrepancy: bool,
    /// Present when the listing lookup failed and the check failed closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiscrepancyCheck {
    pub fn failed_closed(error: impl Into<String>) -> Self {
        Self {
            other_marketplaces: Vec::new(),
            discrepancy: true,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DiscrepancyQuery {
    pub excluding: Option<String>,
}
