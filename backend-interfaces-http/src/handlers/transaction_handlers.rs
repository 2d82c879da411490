use std::str::FromStr;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::warn;

use backend_application::commands::sale_commands::{self, CreateSaleCommand, SaleLine};
use backend_application::AppState;
use backend_domain::{SaleChangeType, StockTransactionRequest, StockTransactionResponse};

use crate::error::HttpError;
use crate::middleware::{authorize, parse_json_body, principal_from_headers};

fn to_command(request: StockTransactionRequest) -> Result<CreateSaleCommand, HttpError> {
    let change_type =
        SaleChangeType::from_str(&request.change_type).map_err(HttpError::BadRequest)?;
    Ok(CreateSaleCommand {
        change_type,
        performed_by: request.performed_by,
        marketplace: request.marketplace,
        tax: request.tax_amount,
        shipping: request.shipping_amount,
        net_amount: request.net_amount,
        idempotency_key: request.idempotency_key,
        items: request
            .items
            .into_iter()
            .map(|item| SaleLine {
                stock_id: item.stock_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
    })
}

pub async fn stock_transaction_operation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<StockTransactionResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let request: StockTransactionRequest = parse_json_body(&headers, &body).map_err(|err| {
        warn!("failed to parse stock transaction body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;
    let command = to_command(request)?;
    let principal = principal_from_headers(&headers);

    let outcome = sale_commands::create_sale_transaction(&state, &principal, command).await?;
    Ok(Json(StockTransactionResponse {
        success: true,
        transaction: outcome.transaction,
        items: outcome.items,
        discrepancy: outcome.discrepancy,
        discrepancy_details: outcome.discrepancy_details,
        replayed: outcome.replayed,
        notifications_created: outcome.notifications_created,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sale_change_types_are_accepted() {
        let request: StockTransactionRequest =
            serde_json::from_str(r#"{"change_type": "manual_edit", "items": []}"#)
                .expect("request json");
        assert!(matches!(to_command(request), Err(HttpError::BadRequest(_))));

        let request: StockTransactionRequest = serde_json::from_str(
            r#"{"change_type": "marketplace_sale", "marketplace": "tcgplayer", "items": [
                {"stock_id": "00000000-0000-0000-0000-000000000001", "quantity": 2, "unit_price": 1.25}
            ]}"#,
        )
        .expect("request json");
        let command = to_command(request).expect("command");
        assert_eq!(command.change_type, SaleChangeType::MarketplaceSale);
        assert_eq!(command.items.len(), 1);
    }
}
