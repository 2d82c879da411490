// In-memory implementation of every storage port.
// Used when no database is configured and as the store behind the integration tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use backend_domain::ports::{
    CardRepository, ListingRepository, NotificationRepository, PriceQueueRepository,
    StockRepository, TransactionRepository,
};
use backend_domain::{
    AuditLogEntry, Card, LedgerWrite, MarketplaceListing, Notification, PriceQueueItem,
    PriceRecord, QueueStatus, SaleCommit, StockRecord, StoreError, Transaction, TransactionItem,
};

const STALE_CLAIM_ERROR: &str = "claim abandoned while processing";

#[derive(Default)]
struct Tables {
    stocks: HashMap<Uuid, StockRecord>,
    audit: Vec<AuditLogEntry>,
    transactions: Vec<Transaction>,
    transaction_items: Vec<TransactionItem>,
    listings: Vec<MarketplaceListing>,
    notifications: Vec<Notification>,
    queue: Vec<PriceQueueItem>,
    cards: HashMap<Uuid, Card>,
    prices: HashMap<Uuid, PriceRecord>,
    watches: Vec<(Uuid, String)>,
}

impl Tables {
    /// Rejects a row that would share (owner, card, condition, language) with another row.
    fn check_unique_stock(&self, candidate: &StockRecord) -> Result<(), StoreError> {
        let Some(card_id) = candidate.core_card_id else {
            return Ok(());
        };
        let clash = self.stocks.values().any(|other| {
            other.id != candidate.id
                && other.owner_id == candidate.owner_id
                && other.core_card_id == Some(card_id)
                && other.condition == candidate.condition
                && other.language == candidate.language
        });
        if clash {
            return Err(StoreError::Duplicate(
                "stock with this card, condition and language already exists".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies one guarded write to `staged`, returning the updated row.
    fn stage_write(
        &self,
        staged: &mut HashMap<Uuid, StockRecord>,
        write: &LedgerWrite,
    ) -> Result<StockRecord, StoreError> {
        let stock_write = &write.stock;
        let current = match staged.get(&stock_write.stock_id) {
            Some(row) => row.clone(),
            None => self
                .stocks
                .get(&stock_write.stock_id)
                .cloned()
                .ok_or(StoreError::NotFound(stock_write.stock_id))?,
        };
        if current.version != stock_write.expected_version {
            return Err(StoreError::ConcurrentModification {
                stock_id: stock_write.stock_id,
                expected: stock_write.expected_version,
            });
        }
        let mut next = current;
        stock_write.fields.apply_to(&mut next);
        next.quantity = stock_write.quantity;
        next.is_active = stock_write.is_active;
        next.updated_at = stock_write.updated_at;
        next.version += 1;
        if !stock_write.fields.is_empty() {
            self.check_unique_stock(&next)?;
        }
        staged.insert(next.id, next.clone());
        Ok(next)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_stock(&self, stock: StockRecord) {
        self.tables.write().await.stocks.insert(stock.id, stock);
    }

    pub async fn add_listing(&self, stock_id: Uuid, marketplace_id: &str) {
        self.tables.write().await.listings.push(MarketplaceListing {
            stock_id,
            marketplace_id: marketplace_id.to_string(),
        });
    }

    pub async fn insert_card(&self, card: Card) {
        self.tables.write().await.cards.insert(card.id, card);
    }

    pub async fn insert_price(&self, record: PriceRecord) {
        self.tables
            .write()
            .await
            .prices
            .insert(record.core_card_id, record);
    }

    pub async fn enqueue_price(&self, item: PriceQueueItem) {
        self.tables.write().await.queue.push(item);
    }

    pub async fn watch_card(&self, core_card_id: Uuid, user_id: &str) {
        self.tables
            .write()
            .await
            .watches
            .push((core_card_id, user_id.to_string()));
    }

    pub async fn stock(&self, stock_id: Uuid) -> Option<StockRecord> {
        self.tables.read().await.stocks.get(&stock_id).cloned()
    }

    pub async fn audit_entries(&self, stock_id: Uuid) -> Vec<AuditLogEntry> {
        self.tables
            .read()
            .await
            .audit
            .iter()
            .filter(|entry| entry.stock_id == stock_id)
            .cloned()
            .collect()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.tables.read().await.transactions.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.tables.read().await.notifications.clone()
    }

    pub async fn queue_items(&self) -> Vec<PriceQueueItem> {
        self.tables.read().await.queue.clone()
    }
}

#[async_trait]
impl StockRepository for MemoryStore {
    async fn get_stock(&self, stock_id: Uuid) -> anyhow::Result<Option<StockRecord>> {
        Ok(self.stock(stock_id).await)
    }

    async fn commit_mutation(&self, write: &LedgerWrite) -> Result<StockRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let mut staged = HashMap::new();
        let updated = tables.stage_write(&mut staged, write)?;
        tables.stocks.insert(updated.id, updated.clone());
        tables.audit.push(write.audit.clone());
        Ok(updated)
    }

    async fn commit_sale(&self, sale: &SaleCommit) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(key) = sale.transaction.idempotency_key.as_deref() {
            let reused = tables
                .transactions
                .iter()
                .any(|tx| tx.idempotency_key.as_deref() == Some(key));
            if reused {
                return Err(StoreError::Duplicate(format!(
                    "idempotency key '{}' already used",
                    key
                )));
            }
        }

        let mut staged = HashMap::new();
        for write in &sale.writes {
            tables.stage_write(&mut staged, write)?;
        }

        tables.stocks.extend(staged);
        tables
            .audit
            .extend(sale.writes.iter().map(|write| write.audit.clone()));
        tables.transactions.push(sale.transaction.clone());
        tables.transaction_items.extend(sale.items.iter().cloned());
        Ok(())
    }

    async fn list_audit(&self, stock_id: Uuid, limit: usize) -> anyhow::Result<Vec<AuditLogEntry>> {
        let mut rows = self.audit_entries(stock_id).await;
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> anyhow::Result<Option<(Transaction, Vec<TransactionItem>)>> {
        let tables = self.tables.read().await;
        let Some(transaction) = tables
            .transactions
            .iter()
            .find(|tx| tx.idempotency_key.as_deref() == Some(key))
            .cloned()
        else {
            return Ok(None);
        };
        let items = tables
            .transaction_items
            .iter()
            .filter(|item| item.transaction_id == transaction.id)
            .cloned()
            .collect();
        Ok(Some((transaction, items)))
    }
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn list_listings(&self, stock_id: Uuid) -> anyhow::Result<Vec<MarketplaceListing>> {
        Ok(self
            .tables
            .read()
            .await
            .listings
            .iter()
            .filter(|listing| listing.stock_id == stock_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notifications(&self, notifications: &[Notification]) -> anyhow::Result<usize> {
        let mut tables = self.tables.write().await;
        let mut keys: HashSet<String> = tables
            .notifications
            .iter()
            .filter_map(|row| row.dedupe_key.clone())
            .collect();
        let mut written = 0;
        for notification in notifications {
            if let Some(key) = &notification.dedupe_key {
                if !keys.insert(key.clone()) {
                    continue;
                }
            }
            tables.notifications.push(notification.clone());
            written += 1;
        }
        Ok(written)
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: usize,
    ) -> anyhow::Result<Vec<Notification>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|row| row.user_id == user_id && (!unread_only || !row.is_read))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn mark_read(&self, user_id: &str, ids: &[Uuid]) -> anyhow::Result<u64> {
        let mut tables = self.tables.write().await;
        let mut updated = 0;
        for row in tables
            .notifications
            .iter_mut()
            .filter(|row| row.user_id == user_id && !row.is_read && ids.contains(&row.id))
        {
            row.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl PriceQueueRepository for MemoryStore {
    async fn claim_next(&self, date: NaiveDate) -> anyhow::Result<Option<PriceQueueItem>> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables
            .queue
            .iter_mut()
            .find(|item| item.created_date == date && item.status == QueueStatus::Pending)
        else {
            return Ok(None);
        };
        item.status = QueueStatus::Processing;
        item.claimed_at = Some(Utc::now());
        Ok(Some(item.clone()))
    }

    async fn count_pending(&self, date: NaiveDate) -> anyhow::Result<u64> {
        Ok(self
            .tables
            .read()
            .await
            .queue
            .iter()
            .filter(|item| item.created_date == date && item.status == QueueStatus::Pending)
            .count() as u64)
    }

    async fn mark_completed(&self, id: Uuid) -> anyhow::Result<()> {
        self.update_queue_item(id, |item| {
            item.status = QueueStatus::Completed;
            item.last_error = None;
            item.claimed_at = None;
        })
        .await
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> anyhow::Result<()> {
        self.update_queue_item(id, |item| {
            item.status = QueueStatus::Failed;
            item.attempts += 1;
            item.last_error = Some(error.to_string());
            item.claimed_at = None;
        })
        .await
    }

    async fn requeue_failed(&self, date: NaiveDate, max_attempts: i32) -> anyhow::Result<u64> {
        let mut tables = self.tables.write().await;
        let mut count = 0;
        for item in tables.queue.iter_mut().filter(|item| {
            item.created_date == date
                && item.status == QueueStatus::Failed
                && item.attempts < max_attempts
        }) {
            item.status = QueueStatus::Pending;
            count += 1;
        }
        Ok(count)
    }

    async fn count_retryable(&self, date: NaiveDate, max_attempts: i32) -> anyhow::Result<u64> {
        Ok(self
            .tables
            .read()
            .await
            .queue
            .iter()
            .filter(|item| {
                item.created_date == date
                    && item.status == QueueStatus::Failed
                    && item.attempts < max_attempts
            })
            .count() as u64)
    }

    async fn fail_stale_claims(
        &self,
        date: NaiveDate,
        claimed_before: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let mut tables = self.tables.write().await;
        let mut count = 0;
        for item in tables.queue.iter_mut().filter(|item| {
            item.created_date == date
                && item.status == QueueStatus::Processing
                && item.claimed_at.map_or(true, |at| at < claimed_before)
        }) {
            item.status = QueueStatus::Failed;
            item.attempts += 1;
            item.last_error = Some(STALE_CLAIM_ERROR.to_string());
            item.claimed_at = None;
            count += 1;
        }
        Ok(count)
    }
}

impl MemoryStore {
    async fn update_queue_item(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut PriceQueueItem),
    ) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        let item = tables
            .queue
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| anyhow::anyhow!("price queue item {} not found", id))?;
        apply(item);
        Ok(())
    }
}

#[async_trait]
impl CardRepository for MemoryStore {
    async fn get_card(&self, core_card_id: Uuid) -> anyhow::Result<Option<Card>> {
        Ok(self.tables.read().await.cards.get(&core_card_id).cloned())
    }

    async fn get_price(&self, core_card_id: Uuid) -> anyhow::Result<Option<PriceRecord>> {
        Ok(self.tables.read().await.prices.get(&core_card_id).cloned())
    }

    async fn upsert_price(&self, record: &PriceRecord) -> anyhow::Result<()> {
        self.insert_price(record.clone()).await;
        Ok(())
    }

    async fn list_price_subscribers(&self, core_card_id: Uuid) -> anyhow::Result<Vec<String>> {
        let tables = self.tables.read().await;
        let mut users: BTreeSet<String> = tables
            .stocks
            .values()
            .filter(|stock| stock.is_active && stock.core_card_id == Some(core_card_id))
            .map(|stock| stock.owner_id.clone())
            .collect();
        users.extend(
            tables
                .watches
                .iter()
                .filter(|(card_id, _)| *card_id == core_card_id)
                .map(|(_, user_id)| user_id.clone()),
        );
        Ok(users.into_iter().collect())
    }
}
