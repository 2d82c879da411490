use std::str::FromStr;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use backend_domain::ports::{
    CardRepository, ListingRepository, NotificationRepository, PriceQueueRepository,
    StockRepository, TransactionRepository,
};
use backend_domain::{
    AuditLogEntry, Card, ChangeType, DbConfig, ExternalSource, LedgerWrite, MarketplaceListing,
    Notification, NotificationType, PriceQueueItem, PriceRecord, QueueStatus, SaleCommit,
    StockRecord, StockWrite, StoreError, Transaction, TransactionItem, TransactionType,
};

type PgTransaction<'a> = sqlx::Transaction<'a, Postgres>;

const UNIQUE_VIOLATION: &str = "23505";

const STOCK_COLUMNS: &str = "id, owner_id, core_card_id, quantity, condition, language, sku, \
     location, cost_basis, is_active, version, updated_at";

const AUDIT_COLUMNS: &str = "id, stock_id, owner_id, quantity_before, quantity_after, \
     change_type, performed_by, transaction_id, created_at";

const TRANSACTION_COLUMNS: &str = "id, owner_id, type, source, is_integration, subtotal, tax, \
     shipping, net_amount, performed_by, idempotency_key, created_at";

const NOTIFICATION_COLUMNS: &str = "id, user_id, stock_id, marketplace_id, core_card_id, \
     notification_type, message, metadata, is_read, dedupe_key, created_at";

const QUEUE_COLUMNS: &str =
    "id, core_card_id, created_date, status, attempts, last_error, claimed_at";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS stock (
        id UUID PRIMARY KEY,
        owner_id TEXT NOT NULL,
        core_card_id UUID,
        quantity INTEGER NOT NULL CHECK (quantity >= 0),
        condition TEXT,
        language TEXT,
        sku TEXT,
        location TEXT,
        cost_basis NUMERIC(14, 2),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        version BIGINT NOT NULL DEFAULT 0,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS stock_card_variant_idx
        ON stock (owner_id, core_card_id, condition, language)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stock_audit_log (
        id UUID PRIMARY KEY,
        stock_id UUID NOT NULL REFERENCES stock (id),
        owner_id TEXT NOT NULL,
        quantity_before INTEGER NOT NULL,
        quantity_after INTEGER NOT NULL,
        change_type TEXT NOT NULL,
        performed_by TEXT NOT NULL,
        transaction_id UUID,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS stock_audit_log_stock_idx
        ON stock_audit_log (stock_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id UUID PRIMARY KEY,
        owner_id TEXT NOT NULL,
        type TEXT NOT NULL,
        source TEXT NOT NULL,
        is_integration BOOLEAN NOT NULL,
        subtotal NUMERIC(14, 2) NOT NULL,
        tax NUMERIC(14, 2) NOT NULL,
        shipping NUMERIC(14, 2) NOT NULL,
        net_amount NUMERIC(14, 2) NOT NULL,
        performed_by TEXT NOT NULL,
        idempotency_key TEXT UNIQUE,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transaction_items (
        id UUID PRIMARY KEY,
        transaction_id UUID NOT NULL REFERENCES transactions (id),
        stock_id UUID NOT NULL REFERENCES stock (id),
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        unit_price NUMERIC(14, 2) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS marketplace_listings (
        stock_id UUID NOT NULL REFERENCES stock (id),
        marketplace_id TEXT NOT NULL,
        PRIMARY KEY (stock_id, marketplace_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL,
        stock_id UUID,
        marketplace_id TEXT,
        core_card_id UUID,
        notification_type TEXT NOT NULL,
        message TEXT NOT NULL,
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        is_read BOOLEAN NOT NULL DEFAULT FALSE,
        dedupe_key TEXT UNIQUE,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS notifications_user_idx
        ON notifications (user_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cards (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        external_source TEXT NOT NULL,
        external_id TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS card_prices (
        core_card_id UUID PRIMARY KEY REFERENCES cards (id),
        tcgplayer_price NUMERIC(14, 2),
        cardmarket_price NUMERIC(14, 2),
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS price_watches (
        core_card_id UUID NOT NULL REFERENCES cards (id),
        user_id TEXT NOT NULL,
        PRIMARY KEY (core_card_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS price_queue (
        id UUID PRIMARY KEY,
        core_card_id UUID NOT NULL,
        created_date DATE NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        attempts INTEGER NOT NULL DEFAULT 0,
        last_error TEXT,
        claimed_at TIMESTAMPTZ,
        enqueued_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    ALTER TABLE price_queue ADD COLUMN IF NOT EXISTS claimed_at TIMESTAMPTZ
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS price_queue_day_status_idx
        ON price_queue (created_date, status)
    "#,
];

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow!("database_url is not configured"))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("database schema ready");
        Ok(())
    }
}

fn store_err(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Duplicate(db_err.message().to_string());
        }
    }
    StoreError::Other(err.into())
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(|err| anyhow!(err))
}

fn stock_from_row(row: &PgRow) -> Result<StockRecord> {
    Ok(StockRecord {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        core_card_id: row.try_get("core_card_id")?,
        quantity: row.try_get("quantity")?,
        condition: row.try_get("condition")?,
        language: row.try_get("language")?,
        sku: row.try_get("sku")?,
        location: row.try_get("location")?,
        cost_basis: row.try_get("cost_basis")?,
        is_active: row.try_get("is_active")?,
        version: row.try_get("version")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn audit_from_row(row: &PgRow) -> Result<AuditLogEntry> {
    Ok(AuditLogEntry {
        id: row.try_get("id")?,
        stock_id: row.try_get("stock_id")?,
        owner_id: row.try_get("owner_id")?,
        quantity_before: row.try_get("quantity_before")?,
        quantity_after: row.try_get("quantity_after")?,
        change_type: parse_column::<ChangeType>(row, "change_type")?,
        performed_by: row.try_get("performed_by")?,
        transaction_id: row.try_get("transaction_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction> {
    Ok(Transaction {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        transaction_type: parse_column::<TransactionType>(row, "type")?,
        source: row.try_get("source")?,
        is_integration: row.try_get("is_integration")?,
        subtotal: row.try_get("subtotal")?,
        tax: row.try_get("tax")?,
        shipping: row.try_get("shipping")?,
        net_amount: row.try_get("net_amount")?,
        performed_by: row.try_get("performed_by")?,
        idempotency_key: row.try_get("idempotency_key")?,
        created_at: row.try_get("created_at")?,
    })
}

fn notification_from_row(row: &PgRow) -> Result<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        stock_id: row.try_get("stock_id")?,
        marketplace_id: row.try_get("marketplace_id")?,
        core_card_id: row.try_get("core_card_id")?,
        notification_type: parse_column::<NotificationType>(row, "notification_type")?,
        message: row.try_get("message")?,
        metadata: row.try_get("metadata")?,
        is_read: row.try_get("is_read")?,
        dedupe_key: row.try_get("dedupe_key")?,
        created_at: row.try_get("created_at")?,
    })
}

fn queue_item_from_row(row: &PgRow) -> Result<PriceQueueItem> {
    Ok(PriceQueueItem {
        id: row.try_get("id")?,
        core_card_id: row.try_get("core_card_id")?,
        created_date: row.try_get("created_date")?,
        status: parse_column::<QueueStatus>(row, "status")?,
        attempts: row.try_get("attempts")?,
        last_error: row.try_get("last_error")?,
        claimed_at: row.try_get("claimed_at")?,
    })
}

/// Applies a version-guarded stock update inside `tx`.
async fn apply_stock_write(
    tx: &mut PgTransaction<'_>,
    write: &StockWrite,
) -> Result<StockRecord, StoreError> {
    let sql = format!(
        r#"
        UPDATE stock SET
            quantity = $3,
            is_active = $4,
            condition = COALESCE($5, condition),
            language = COALESCE($6, language),
            sku = COALESCE($7, sku),
            location = COALESCE($8, location),
            cost_basis = COALESCE($9, cost_basis),
            updated_at = $10,
            version = version + 1
        WHERE id = $1 AND version = $2
        RETURNING {}
        "#,
        STOCK_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(write.stock_id)
        .bind(write.expected_version)
        .bind(write.quantity)
        .bind(write.is_active)
        .bind(write.fields.condition.as_deref())
        .bind(write.fields.language.as_deref())
        .bind(write.fields.sku.as_deref())
        .bind(write.fields.location.as_deref())
        .bind(write.fields.cost_basis)
        .bind(write.updated_at)
        .fetch_optional(&mut **tx)
        .await
        .map_err(store_err)?;

    if let Some(row) = row {
        return stock_from_row(&row).map_err(StoreError::Other);
    }

    let exists = sqlx::query("SELECT 1 FROM stock WHERE id = $1")
        .bind(write.stock_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(store_err)?
        .is_some();
    if exists {
        Err(StoreError::ConcurrentModification {
            stock_id: write.stock_id,
            expected: write.expected_version,
        })
    } else {
        Err(StoreError::NotFound(write.stock_id))
    }
}

async fn insert_audit(tx: &mut PgTransaction<'_>, entry: &AuditLogEntry) -> Result<(), StoreError> {
    let sql = format!(
        "INSERT INTO stock_audit_log ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        AUDIT_COLUMNS
    );
    sqlx::query(&sql)
        .bind(entry.id)
        .bind(entry.stock_id)
        .bind(&entry.owner_id)
        .bind(entry.quantity_before)
        .bind(entry.quantity_after)
        .bind(entry.change_type.as_str())
        .bind(&entry.performed_by)
        .bind(entry.transaction_id)
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await
        .map_err(store_err)?;
    Ok(())
}

#[async_trait]
impl StockRepository for PgStore {
    async fn get_stock(&self, stock_id: Uuid) -> Result<Option<StockRecord>> {
        let sql = format!("SELECT {} FROM stock WHERE id = $1", STOCK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(stock_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(stock_from_row).transpose()
    }

    async fn commit_mutation(&self, write: &LedgerWrite) -> Result<StockRecord, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        let updated = apply_stock_write(&mut tx, &write.stock).await?;
        insert_audit(&mut tx, &write.audit).await?;
        tx.commit().await.map_err(store_err)?;
        Ok(updated)
    }

    async fn commit_sale(&self, sale: &SaleCommit) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let transaction = &sale.transaction;
        let sql = format!(
            "INSERT INTO transactions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            TRANSACTION_COLUMNS
        );
        sqlx::query(&sql)
            .bind(transaction.id)
            .bind(&transaction.owner_id)
            .bind(transaction.transaction_type.as_str())
            .bind(&transaction.source)
            .bind(transaction.is_integration)
            .bind(transaction.subtotal)
            .bind(transaction.tax)
            .bind(transaction.shipping)
            .bind(transaction.net_amount)
            .bind(&transaction.performed_by)
            .bind(transaction.idempotency_key.as_deref())
            .bind(transaction.created_at)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        for write in &sale.writes {
            apply_stock_write(&mut tx, &write.stock).await?;
            insert_audit(&mut tx, &write.audit).await?;
        }

        for item in &sale.items {
            sqlx::query(
                "INSERT INTO transaction_items (id, transaction_id, stock_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item.id)
            .bind(item.transaction_id)
            .bind(item.stock_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    async fn list_audit(&self, stock_id: Uuid, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let sql = format!(
            "SELECT {} FROM stock_audit_log WHERE stock_id = $1 ORDER BY created_at DESC LIMIT $2",
            AUDIT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(stock_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(audit_from_row).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for PgStore {
    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<(Transaction, Vec<TransactionItem>)>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE idempotency_key = $1",
            TRANSACTION_COLUMNS
        );
        let Some(row) = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let transaction = transaction_from_row(&row)?;

        let item_rows = sqlx::query(
            "SELECT id, transaction_id, stock_id, quantity, unit_price \
             FROM transaction_items WHERE transaction_id = $1",
        )
        .bind(transaction.id)
        .fetch_all(&self.pool)
        .await?;
        let items = item_rows
            .iter()
            .map(|row| {
                Ok(TransactionItem {
                    id: row.try_get("id")?,
                    transaction_id: row.try_get("transaction_id")?,
                    stock_id: row.try_get("stock_id")?,
                    quantity: row.try_get("quantity")?,
                    unit_price: row.try_get("unit_price")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some((transaction, items)))
    }
}

#[async_trait]
impl ListingRepository for PgStore {
    async fn list_listings(&self, stock_id: Uuid) -> Result<Vec<MarketplaceListing>> {
        let rows = sqlx::query(
            "SELECT stock_id, marketplace_id FROM marketplace_listings \
             WHERE stock_id = $1 ORDER BY marketplace_id",
        )
        .bind(stock_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                Ok(MarketplaceListing {
                    stock_id: row.try_get("stock_id")?,
                    marketplace_id: row.try_get("marketplace_id")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn insert_notifications(&self, notifications: &[Notification]) -> Result<usize> {
        let sql = format!(
            "INSERT INTO notifications ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (dedupe_key) DO NOTHING",
            NOTIFICATION_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;
        for notification in notifications {
            let result = sqlx::query(&sql)
                .bind(notification.id)
                .bind(&notification.user_id)
                .bind(notification.stock_id)
                .bind(notification.marketplace_id.as_deref())
                .bind(notification.core_card_id)
                .bind(notification.notification_type.as_str())
                .bind(&notification.message)
                .bind(&notification.metadata)
                .bind(notification.is_read)
                .bind(notification.dedupe_key.as_deref())
                .bind(notification.created_at)
                .execute(&mut *tx)
                .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;
        Ok(written as usize)
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read) \
             ORDER BY created_at DESC LIMIT $3",
            NOTIFICATION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(&self, user_id: &str, ids: &[Uuid]) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE \
             WHERE user_id = $1 AND id = ANY($2) AND NOT is_read",
        )
        .bind(user_id)
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PriceQueueRepository for PgStore {
    async fn claim_next(&self, date: NaiveDate) -> Result<Option<PriceQueueItem>> {
        let sql = format!(
            "UPDATE price_queue SET status = 'processing', claimed_at = now(), updated_at = now() \
             WHERE id = ( \
                 SELECT id FROM price_queue WHERE created_date = $1 AND status = 'pending' \
                 ORDER BY enqueued_at, id LIMIT 1 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {}",
            QUEUE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(queue_item_from_row).transpose()
    }

    async fn count_pending(&self, date: NaiveDate) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS pending FROM price_queue WHERE created_date = $1 AND status = 'pending'",
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        let pending: i64 = row.try_get("pending")?;
        Ok(pending.max(0) as u64)
    }

    async fn mark_completed(&self, id: Uuid) -> Result<()> {
        self.set_queue_status(id, QueueStatus::Completed, None).await
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        self.set_queue_status(id, QueueStatus::Failed, Some(error))
            .await
    }

    async fn requeue_failed(&self, date: NaiveDate, max_attempts: i32) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE price_queue SET status = 'pending', updated_at = now() \
             WHERE created_date = $1 AND status = 'failed' AND attempts < $2",
        )
        .bind(date)
        .bind(max_attempts)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_retryable(&self, date: NaiveDate, max_attempts: i32) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS retryable FROM price_queue \
             WHERE created_date = $1 AND status = 'failed' AND attempts < $2",
        )
        .bind(date)
        .bind(max_attempts)
        .fetch_one(&self.pool)
        .await?;
        let retryable: i64 = row.try_get("retryable")?;
        Ok(retryable.max(0) as u64)
    }

    async fn fail_stale_claims(
        &self,
        date: NaiveDate,
        claimed_before: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE price_queue SET status = 'failed', attempts = attempts + 1, \
                 last_error = 'claim abandoned while processing', claimed_at = NULL, updated_at = now() \
             WHERE created_date = $1 AND status = 'processing' \
               AND (claimed_at IS NULL OR claimed_at < $2)",
        )
        .bind(date)
        .bind(claimed_before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

impl PgStore {
    async fn set_queue_status(&self, id: Uuid, status: QueueStatus, error: Option<&str>) -> Result<()> {
        let failed = status == QueueStatus::Failed;
        let result = sqlx::query(
            "UPDATE price_queue SET status = $2, \
                 attempts = attempts + CASE WHEN $3 THEN 1 ELSE 0 END, \
                 last_error = $4, claimed_at = NULL, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(failed)
        .bind(error)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(anyhow!("price queue item {} not found", id));
        }
        Ok(())
    }
}

#[async_trait]
impl CardRepository for PgStore {
    async fn get_card(&self, core_card_id: Uuid) -> Result<Option<Card>> {
        let row = sqlx::query("SELECT id, name, external_source, external_id FROM cards WHERE id = $1")
            .bind(core_card_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Card {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            external_source: parse_column::<ExternalSource>(&row, "external_source")?,
            external_id: row.try_get("external_id")?,
        }))
    }

    async fn get_price(&self, core_card_id: Uuid) -> Result<Option<PriceRecord>> {
        let row = sqlx::query(
            "SELECT core_card_id, tcgplayer_price, cardmarket_price, updated_at \
             FROM card_prices WHERE core_card_id = $1",
        )
        .bind(core_card_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(PriceRecord {
            core_card_id: row.try_get("core_card_id")?,
            tcgplayer_price: row.try_get("tcgplayer_price")?,
            cardmarket_price: row.try_get("cardmarket_price")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn upsert_price(&self, record: &PriceRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO card_prices (core_card_id, tcgplayer_price, cardmarket_price, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (core_card_id) DO UPDATE SET
                tcgplayer_price = EXCLUDED.tcgplayer_price,
                cardmarket_price = EXCLUDED.cardmarket_price,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.core_card_id)
        .bind(record.tcgplayer_price)
        .bind(record.cardmarket_price)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_price_subscribers(&self, core_card_id: Uuid) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT owner_id AS user_id FROM stock WHERE core_card_id = $1 AND is_active
            UNION
            SELECT user_id FROM price_watches WHERE core_card_id = $1
            ORDER BY user_id
            "#,
        )
        .bind(core_card_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| Ok(row.try_get::<String, _>("user_id")?))
            .collect()
    }
}
