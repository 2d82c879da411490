// Pricing entities
// Cards, their current prices, and the daily refresh queue

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{ExternalSource, QueueStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub name: String,
    pub external_source: ExternalSource,
    /// Identifier of the card at `external_source` (a Scryfall card id, for example).
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub core_card_id: Uuid,
    pub tcgplayer_price: Option<Decimal>,
    pub cardmarket_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub tcgplayer_price: Option<Decimal>,
    pub cardmarket_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQueueItem {
    pub id: Uuid,
    pub core_card_id: Uuid,
    pub created_date: NaiveDate,
    pub status: QueueStatus,
    pub attempts: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Set when a run claims the item; cleared once it resolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
}

impl PriceQueueItem {
    pub fn pending(core_card_id: Uuid, created_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            core_card_id,
            created_date,
            status: QueueStatus::Pending,
            attempts: 0,
            last_error: None,
            claimed_at: None,
        }
    }
}
