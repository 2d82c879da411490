use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use tracing::{error, info, warn};
use uuid::Uuid;

use backend_application::commands::price_refresh_commands::{self, BatchTrigger};
use backend_application::queries::price_queries;
use backend_application::{AppError, AppState};
use backend_domain::{PriceRecord, PriceUpdateRequest, PriceUpdateResponse};

use crate::error::HttpError;
use crate::middleware::{authorize, parse_json_body};

pub async fn daily_price_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<PriceUpdateResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let request: PriceUpdateRequest = if body.is_empty() {
        PriceUpdateRequest::default()
    } else {
        parse_json_body(&headers, &body).map_err(|err| {
            warn!("failed to parse price update body: {}", err);
            HttpError::BadRequest(err.to_string())
        })?
    };

    let trigger = BatchTrigger {
        auto_invoked: request.auto_invoked,
        batch_continue: request.batch_continue,
    };
    // A dropped request must not cancel the batch between claiming and resolving an item.
    let batch_state = state.clone();
    let summary = tokio::spawn(async move {
        price_refresh_commands::run_price_refresh_batch(&batch_state, trigger).await
    })
    .await
    .map_err(|err| {
        error!("price batch task failed: {}", err);
        AppError::Internal(anyhow::anyhow!("price batch task failed: {}", err))
    })??;
    info!(
        processed = summary.processed,
        failed = summary.failed,
        remaining = summary.remaining,
        "price update request finished"
    );
    Ok(Json(PriceUpdateResponse {
        success: true,
        processed: summary.processed,
        failed: summary.failed,
        remaining: summary.remaining,
        execution_ms: summary.execution_ms,
        will_continue: summary.will_continue,
    }))
}

pub async fn get_card_price(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(core_card_id): Path<Uuid>,
) -> Result<Json<PriceRecord>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let record = price_queries::get_price(&state, core_card_id).await?;
    Ok(Json(record))
}

pub async fn refresh_card_price(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(core_card_id): Path<Uuid>,
) -> Result<Json<PriceRecord>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let record = price_refresh_commands::refresh_card_price(&state, core_card_id).await?;
    Ok(Json(record))
}
