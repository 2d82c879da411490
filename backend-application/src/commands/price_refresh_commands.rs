use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::commands::notification_commands::emit_price_alerts;
use crate::AppError;
use crate::AppState;
use backend_domain::services::PriceMove;
use backend_domain::{today_utc, PriceFetchError, PriceQueueItem, PriceRecord};

/// How a batch run was started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTrigger {
    /// Started by the scheduler rather than an operator.
    pub auto_invoked: bool,
    /// Continuation of an earlier run today; failed items are not re-queued.
    pub batch_continue: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceBatchSummary {
    pub processed: usize,
    pub failed: usize,
    pub remaining: u64,
    pub will_continue: bool,
    /// Failed items still under the attempt cap once the queue is drained.
    pub retryable: u64,
    pub execution_ms: u64,
    pub stopped_by_budget: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Priced { alerts: usize },
    FirstPrice,
}

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("card {0} not found")]
    CardNotFound(Uuid),
    #[error(transparent)]
    Fetch(#[from] PriceFetchError),
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Drains up to one batch of today's price queue.
///
/// Items are claimed one at a time; a failing item is marked `failed` and the
/// batch moves on. Claims abandoned by an earlier run are failed first so they
/// can be retried. When pending items remain, exactly one continuation is
/// scheduled.
pub async fn run_price_refresh_batch(
    state: &AppState,
    trigger: BatchTrigger,
) -> Result<PriceBatchSummary, AppError> {
    let started = Instant::now();
    let config = &state.config;
    let budget = Duration::from_secs(config.price_batch_time_budget_seconds);
    let today = today_utc();

    if let Some(stale_before) = stale_claim_cutoff(config.price_stale_claim_seconds) {
        match state
            .price_queue_repo
            .fail_stale_claims(today, stale_before)
            .await
        {
            Ok(0) => {}
            Ok(count) => warn!(count, "failed abandoned price claims"),
            Err(err) => warn!("failed to recover abandoned price claims: {}", err),
        }
    }

    if !trigger.batch_continue {
        match state
            .price_queue_repo
            .requeue_failed(today, config.price_max_attempts)
            .await
        {
            Ok(0) => {}
            Ok(count) => info!(count, "re-queued failed price items"),
            Err(err) => warn!("failed to re-queue failed price items: {}", err),
        }
    }

    let interval = Duration::from_millis(config.price_request_interval_ms);
    let mut summary = PriceBatchSummary::default();

    while summary.processed < config.price_batch_size {
        if summary.processed > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        if started.elapsed() >= budget {
            warn!(handled = summary.processed, "price batch time budget exhausted");
            summary.stopped_by_budget = true;
            break;
        }
        let claimed = state.price_queue_repo.claim_next(today).await.map_err(|err| {
            error!("failed to read price queue: {}", err);
            AppError::Internal(err.context("failed to read price queue"))
        })?;
        let Some(item) = claimed else {
            break;
        };

        summary.processed += 1;
        match process_queue_item(state, &item).await {
            Ok(outcome) => {
                if let Err(err) = state.price_queue_repo.mark_completed(item.id).await {
                    error!(queue_item_id = %item.id, "failed to complete price item: {}", err);
                }
                if let ItemOutcome::Priced { alerts } = outcome {
                    if alerts > 0 {
                        info!(core_card_id = %item.core_card_id, alerts, "price alerts emitted");
                    }
                }
            }
            Err(err) => {
                summary.failed += 1;
                warn!(
                    queue_item_id = %item.id,
                    core_card_id = %item.core_card_id,
                    attempts = item.attempts + 1,
                    "price refresh failed: {}", err
                );
                if let Err(mark_err) = state
                    .price_queue_repo
                    .mark_failed(item.id, &err.to_string())
                    .await
                {
                    error!(queue_item_id = %item.id, "failed to mark price item failed: {}", mark_err);
                }
            }
        }
    }

    if summary.processed == 0 && !summary.stopped_by_budget {
        info!(
            auto_invoked = trigger.auto_invoked,
            "price queue empty, nothing to refresh"
        );
        summary.retryable = count_retryable(state, today).await;
        summary.execution_ms = started.elapsed().as_millis() as u64;
        return Ok(summary);
    }

    summary.remaining = state
        .price_queue_repo
        .count_pending(today)
        .await
        .map_err(|err| {
            error!("failed to count pending price items: {}", err);
            AppError::Internal(err.context("failed to count pending price items"))
        })?;
    summary.will_continue = summary.remaining > 0;
    if summary.will_continue {
        state.continuation.schedule_continuation();
    } else {
        summary.retryable = count_retryable(state, today).await;
    }

    summary.execution_ms = started.elapsed().as_millis() as u64;
    state
        .metrics
        .record_price_batch(summary.processed - summary.failed, summary.failed);
    info!(
        processed = summary.processed,
        failed = summary.failed,
        remaining = summary.remaining,
        retryable = summary.retryable,
        will_continue = summary.will_continue,
        execution_ms = summary.execution_ms,
        "price batch finished"
    );
    Ok(summary)
}

fn stale_claim_cutoff(stale_claim_seconds: u64) -> Option<DateTime<Utc>> {
    let window = chrono::Duration::from_std(Duration::from_secs(stale_claim_seconds)).ok()?;
    Utc::now().checked_sub_signed(window)
}

async fn count_retryable(state: &AppState, today: NaiveDate) -> u64 {
    state
        .price_queue_repo
        .count_retryable(today, state.config.price_max_attempts)
        .await
        .unwrap_or_else(|err| {
            warn!("failed to count retryable price items: {}", err);
            0
        })
}

async fn process_queue_item(
    state: &AppState,
    item: &PriceQueueItem,
) -> Result<ItemOutcome, ItemError> {
    let card = state
        .card_repo
        .get_card(item.core_card_id)
        .await?
        .ok_or(ItemError::CardNotFound(item.core_card_id))?;
    let existing = state.card_repo.get_price(card.id).await?;

    let timeout = Duration::from_secs(state.config.request_timeout_seconds.max(1));
    let quote = tokio::time::timeout(timeout, state.price_fetcher.fetch_prices(&card))
        .await
        .map_err(|_| PriceFetchError::Timeout(card.external_source.to_string()))??;

    let movement = PriceMove::evaluate(existing.as_ref(), &quote);
    state
        .card_repo
        .upsert_price(&PriceRecord {
            core_card_id: card.id,
            tcgplayer_price: quote.tcgplayer_price,
            cardmarket_price: quote.cardmarket_price,
            updated_at: Utc::now(),
        })
        .await?;

    if existing.is_none() {
        return Ok(ItemOutcome::FirstPrice);
    }

    let threshold = state.config.price_alert_threshold_percent;
    let alerts = match movement.alert_field(threshold) {
        Some((field, change)) => {
            match emit_price_alerts(state, &card, &movement, field, change).await {
                Ok(count) => count,
                Err(err) => {
                    warn!(core_card_id = %card.id, "price alerts failed: {}", err);
                    0
                }
            }
        }
        None => 0,
    };
    Ok(ItemOutcome::Priced { alerts })
}

/// Fetches and stores one card's price outside the queue.
///
/// Unlike the batch, an adapter failure here is returned to the caller.
pub async fn refresh_card_price(
    state: &AppState,
    core_card_id: Uuid,
) -> Result<PriceRecord, AppError> {
    let card = state
        .card_repo
        .get_card(core_card_id)
        .await
        .map_err(|err| {
            error!(core_card_id = %core_card_id, "failed to load card: {}", err);
            AppError::Internal(err)
        })?
        .ok_or_else(|| AppError::NotFound(format!("card {} not found", core_card_id)))?;

    let timeout = Duration::from_secs(state.config.request_timeout_seconds.max(1));
    let quote = tokio::time::timeout(timeout, state.price_fetcher.fetch_prices(&card))
        .await
        .map_err(|_| PriceFetchError::Timeout(card.external_source.to_string()))
        .and_then(|result| result)
        .map_err(|err| {
            warn!(core_card_id = %card.id, "price fetch failed: {}", err);
            AppError::ExternalService(err.to_string())
        })?;

    let record = PriceRecord {
        core_card_id: card.id,
        tcgplayer_price: quote.tcgplayer_price,
        cardmarket_price: quote.cardmarket_price,
        updated_at: Utc::now(),
    };
    state.card_repo.upsert_price(&record).await.map_err(|err| {
        error!(core_card_id = %card.id, "failed to store price: {}", err);
        AppError::Internal(err)
    })?;
    Ok(record)
}
