use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::entities::{
    AuditLogEntry, Card, LedgerWrite, MarketplaceListing, Notification, PriceQueueItem,
    PriceRecord, SaleCommit, StockRecord, Transaction, TransactionItem,
};
use crate::errors::StoreError;

#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Returns the row regardless of owner or `is_active`; visibility is the caller's call.
    async fn get_stock(&self, stock_id: Uuid) -> anyhow::Result<Option<StockRecord>>;
    /// Applies the row update and inserts its audit entry atomically.
    async fn commit_mutation(&self, write: &LedgerWrite) -> Result<StockRecord, StoreError>;
    /// Applies every write, then inserts the transaction and its items, atomically.
    async fn commit_sale(&self, sale: &SaleCommit) -> Result<(), StoreError>;
    async fn list_audit(&self, stock_id: Uuid, limit: usize) -> anyhow::Result<Vec<AuditLogEntry>>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> anyhow::Result<Option<(Transaction, Vec<TransactionItem>)>>;
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn list_listings(&self, stock_id: Uuid) -> anyhow::Result<Vec<MarketplaceListing>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Inserts the rows, skipping any whose dedupe key already exists. Returns rows written.
    async fn insert_notifications(&self, notifications: &[Notification]) -> anyhow::Result<usize>;
    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: usize,
    ) -> anyhow::Result<Vec<Notification>>;
    async fn mark_read(&self, user_id: &str, ids: &[Uuid]) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait PriceQueueRepository: Send + Sync {
    /// Moves the oldest `pending` item for `date` to `processing` and returns it.
    /// Concurrent callers never receive the same item.
    async fn claim_next(&self, date: NaiveDate) -> anyhow::Result<Option<PriceQueueItem>>;
    async fn count_pending(&self, date: NaiveDate) -> anyhow::Result<u64>;
    async fn mark_completed(&self, id: Uuid) -> anyhow::Result<()>;
    /// Sets `failed`, increments `attempts` and records the error.
    async fn mark_failed(&self, id: Uuid, error: &str) -> anyhow::Result<()>;
    /// Moves `failed` items for `date` back to `pending` while `attempts < max_attempts`.
    async fn requeue_failed(&self, date: NaiveDate, max_attempts: i32) -> anyhow::Result<u64>;
    /// `failed` items for `date` that `requeue_failed` would still pick up.
    async fn count_retryable(&self, date: NaiveDate, max_attempts: i32) -> anyhow::Result<u64>;
    /// Fails `processing` items for `date` claimed before `claimed_before`, incrementing `attempts`.
    async fn fail_stale_claims(
        &self,
        date: NaiveDate,
        claimed_before: DateTime<Utc>,
    ) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait CardRepository: Send + Sync {
    async fn get_card(&self, core_card_id: Uuid) -> anyhow::Result<Option<Card>>;
    async fn get_price(&self, core_card_id: Uuid) -> anyhow::Result<Option<PriceRecord>>;
    async fn upsert_price(&self, record: &PriceRecord) -> anyhow::Result<()>;
    /// Users who hold active stock of the card or watch it explicitly.
    async fn list_price_subscribers(&self, core_card_id: Uuid) -> anyhow::Result<Vec<String>>;
}
