use tracing::warn;
use uuid::Uuid;

use crate::queries::stock_queries::load_stock_for;
use crate::AppError;
use crate::AppState;
use backend_domain::services::evaluate_discrepancy;
use backend_domain::{DiscrepancyCheck, DiscrepancyQuery, Principal};

/// Marketplaces other than `excluding` that still list the stock.
///
/// Never errors: a failed listing lookup reports a discrepancy with the error attached.
pub async fn check_discrepancy(
    state: &AppState,
    stock_id: Uuid,
    excluding: Option<&str>,
) -> DiscrepancyCheck {
    match state.listing_repo.list_listings(stock_id).await {
        Ok(listings) => evaluate_discrepancy(&listings, excluding),
        Err(err) => {
            warn!(
                stock_id = %stock_id,
                "listing lookup failed, reporting discrepancy: {}", err
            );
            DiscrepancyCheck::failed_closed(err.to_string())
        }
    }
}

pub async fn check_stock_discrepancy(
    state: &AppState,
    principal: &Principal,
    stock_id: Uuid,
    query: DiscrepancyQuery,
) -> Result<DiscrepancyCheck, AppError> {
    load_stock_for(state, principal, stock_id, false).await?;
    let excluding = backend_domain::normalize_marketplace(query.excluding);
    Ok(check_discrepancy(state, stock_id, excluding.as_deref()).await)
}
