use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use tracing::warn;
use uuid::Uuid;

use backend_application::commands::stock_commands::{self, MutateStockCommand};
use backend_application::queries::{discrepancy_queries, stock_queries};
use backend_application::AppState;
use backend_domain::services::resolve_quantity_change;
use backend_domain::{
    normalize_optional_text, AuditLogEntry, AuditQuery, ChangeType, DiscrepancyCheck,
    DiscrepancyQuery, StockFieldUpdates, StockUpdateRequest, StockUpdateResponse,
};

use crate::error::HttpError;
use crate::middleware::{authorize, parse_json_body, principal_from_headers};

fn to_command(request: StockUpdateRequest) -> Result<MutateStockCommand, HttpError> {
    let change_type = ChangeType::from_str(&request.change_type).map_err(HttpError::BadRequest)?;
    if request.cost.map(|cost| cost.is_sign_negative()).unwrap_or(false) {
        return Err(HttpError::BadRequest("cost must not be negative".to_string()));
    }
    Ok(MutateStockCommand {
        stock_id: request.stock_id,
        change_type,
        quantity: resolve_quantity_change(request.quantity_change, request.quantity_new),
        fields: StockFieldUpdates {
            condition: normalize_optional_text(request.condition),
            language: normalize_optional_text(request.language),
            sku: normalize_optional_text(request.sku),
            location: normalize_optional_text(request.location),
            cost_basis: request.cost,
        },
        marketplace: request.marketplace,
        performed_by: request.performed_by,
    })
}

pub async fn stock_update_operation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<StockUpdateResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let request: StockUpdateRequest = parse_json_body(&headers, &body).map_err(|err| {
        warn!("failed to parse stock update body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;
    let command = to_command(request)?;
    let principal = principal_from_headers(&headers);

    let outcome = stock_commands::mutate_stock(&state, &principal, command).await?;
    Ok(Json(StockUpdateResponse {
        success: true,
        quantity_before: outcome.quantity_before,
        quantity_after: outcome.quantity_after,
        discrepancy: outcome.discrepancy,
        quantity_clamped: outcome.quantity_clamped,
        marketplaces_listed: outcome.marketplaces_listed,
        stock_audit_id: outcome.audit_id,
        notifications_created: outcome.notifications_created,
    }))
}

pub async fn stock_audit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(stock_id): Path<Uuid>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let principal = principal_from_headers(&headers);
    let rows = stock_queries::list_stock_audit(&state, &principal, stock_id, query).await?;
    Ok(Json(rows))
}

pub async fn stock_discrepancy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(stock_id): Path<Uuid>,
    Query(query): Query<DiscrepancyQuery>,
) -> Result<Json<DiscrepancyCheck>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let principal = principal_from_headers(&headers);
    let check =
        discrepancy_queries::check_stock_discrepancy(&state, &principal, stock_id, query).await?;
    Ok(Json(check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_domain::QuantityChange;

    fn request(json: &str) -> StockUpdateRequest {
        serde_json::from_str(json).expect("request json")
    }

    #[test]
    fn unknown_change_type_is_rejected() {
        let err = to_command(request(
            r#"{"stock_id": "00000000-0000-0000-0000-000000000001", "change_type": "teleport"}"#,
        ))
        .expect_err("bad change type");
        assert!(matches!(err, HttpError::BadRequest(_)));
    }

    #[test]
    fn absolute_quantity_wins() {
        let command = to_command(request(
            r#"{
                "stock_id": "00000000-0000-0000-0000-000000000001",
                "change_type": "manual_edit",
                "quantity_change": -2,
                "quantity_new": 9,
                "condition": "  "
            }"#,
        ))
        .expect("command");
        assert_eq!(command.quantity, QuantityChange::Absolute(9));
        assert_eq!(command.change_type, ChangeType::ManualEdit);
        assert!(command.fields.condition.is_none());
    }
}
