use std::collections::HashSet;

use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::queries::notification_queries::require_user;
use crate::AppError;
use crate::AppState;
use backend_domain::services::{other_marketplaces, PriceFieldChange, PriceMove};
use backend_domain::{
    notification_dedupe_key, today_utc, Card, DiscrepancyDetail, Notification, NotificationType,
    Principal,
};

fn discrepancy_metadata(
    detail: &DiscrepancyDetail,
    current_marketplace: Option<&str>,
) -> serde_json::Value {
    let mut metadata = json!({
        "quantity_before": detail.quantity_before,
        "quantity_after": detail.quantity_after,
        "quantity_requested": detail.quantity_requested,
        "quantity_clamped": detail.quantity_clamped,
        "source_marketplace": current_marketplace,
    });
    if let Some(error) = &detail.check_error {
        metadata["check_error"] = json!(error);
    }
    metadata
}

/// Writes one discrepancy notification per (stock, other marketplace) pair.
///
/// Listings are re-read for every stock so stale `other_marketplaces` from the
/// detail are only used when that lookup fails. Returns the rows actually written.
pub async fn emit_discrepancy_notifications(
    state: &AppState,
    owner_id: &str,
    details: &[DiscrepancyDetail],
    current_marketplace: Option<&str>,
) -> Result<usize, AppError> {
    let day = today_utc();
    let now = Utc::now();
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for detail in details {
        if !seen.insert(detail.stock_id) {
            continue;
        }
        let marketplaces = match state.listing_repo.list_listings(detail.stock_id).await {
            Ok(listings) => other_marketplaces(&listings, current_marketplace),
            Err(err) => {
                warn!(
                    stock_id = %detail.stock_id,
                    "listing re-resolve failed, using cached marketplaces: {}", err
                );
                detail.other_marketplaces.clone()
            }
        };

        for marketplace in marketplaces {
            rows.push(Notification {
                id: Uuid::new_v4(),
                user_id: owner_id.to_string(),
                stock_id: Some(detail.stock_id),
                marketplace_id: Some(marketplace.clone()),
                core_card_id: None,
                notification_type: NotificationType::DiscrepancyStock,
                message: format!(
                    "Stock changed from {} to {} but is still listed on {}",
                    detail.quantity_before, detail.quantity_after, marketplace
                ),
                metadata: discrepancy_metadata(detail, current_marketplace),
                is_read: false,
                dedupe_key: Some(notification_dedupe_key(
                    NotificationType::DiscrepancyStock,
                    owner_id,
                    detail.stock_id,
                    Some(&marketplace),
                    day,
                )),
                created_at: now,
            });
        }
    }

    if rows.is_empty() {
        return Ok(0);
    }

    let written = state
        .notification_repo
        .insert_notifications(&rows)
        .await
        .map_err(|err| {
            error!(owner_id, "failed to insert discrepancy notifications: {}", err);
            AppError::Internal(err)
        })?;
    state.metrics.record_notifications(written);
    info!(owner_id, candidates = rows.len(), written, "discrepancy notifications emitted");
    Ok(written)
}

fn price_text(value: Option<rust_decimal::Decimal>) -> String {
    value
        .map(|price| format!("${:.2}", price))
        .unwrap_or_else(|| "none".to_string())
}

fn field_metadata(change: &PriceFieldChange) -> serde_json::Value {
    json!({
        "old": change.old,
        "new": change.new,
        "percent": change.percent,
    })
}

/// Notifies every subscriber of `card` about the move on `field`.
pub async fn emit_price_alerts(
    state: &AppState,
    card: &Card,
    movement: &PriceMove,
    field: &str,
    change: &PriceFieldChange,
) -> Result<usize, AppError> {
    let subscribers = state
        .card_repo
        .list_price_subscribers(card.id)
        .await
        .map_err(|err| {
            error!(core_card_id = %card.id, "failed to list price subscribers: {}", err);
            AppError::Internal(err)
        })?;
    if subscribers.is_empty() {
        return Ok(0);
    }

    let day = today_utc();
    let now = Utc::now();
    let direction = change.direction();
    let percent = change.percent.unwrap_or_default();
    let message = format!(
        "{} {} price {} {:.1}% ({} -> {})",
        card.name,
        field,
        direction.as_str(),
        percent.abs(),
        price_text(change.old),
        price_text(change.new)
    );
    let metadata = json!({
        "direction": direction.as_str(),
        "field": field,
        "percent": percent,
        "tcgplayer": field_metadata(&movement.tcgplayer),
        "cardmarket": field_metadata(&movement.cardmarket),
    });

    let rows: Vec<Notification> = subscribers
        .iter()
        .map(|user_id| Notification {
            id: Uuid::new_v4(),
            user_id: user_id.clone(),
            stock_id: None,
            marketplace_id: None,
            core_card_id: Some(card.id),
            notification_type: NotificationType::PriceAlert,
            message: message.clone(),
            metadata: metadata.clone(),
            is_read: false,
            dedupe_key: Some(notification_dedupe_key(
                NotificationType::PriceAlert,
                user_id,
                card.id,
                None,
                day,
            )),
            created_at: now,
        })
        .collect();

    let written = state
        .notification_repo
        .insert_notifications(&rows)
        .await
        .map_err(|err| {
            error!(core_card_id = %card.id, "failed to insert price alerts: {}", err);
            AppError::Internal(err)
        })?;
    state.metrics.record_notifications(written);
    Ok(written)
}

pub async fn mark_notifications_read(
    state: &AppState,
    principal: &Principal,
    ids: Vec<Uuid>,
) -> Result<u64, AppError> {
    let user_id = require_user(principal)?;
    if ids.is_empty() {
        return Ok(0);
    }
    state
        .notification_repo
        .mark_read(user_id, &ids)
        .await
        .map_err(|err| {
            error!("failed to mark notifications read: {}", err);
            AppError::Internal(err)
        })
}
