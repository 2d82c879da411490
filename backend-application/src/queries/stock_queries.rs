use tracing::error;
use uuid::Uuid;

use crate::AppError;
use crate::AppState;
use backend_domain::{AuditLogEntry, AuditQuery, Principal, StockRecord};

const DEFAULT_AUDIT_LIMIT: usize = 50;
const MAX_AUDIT_LIMIT: usize = 500;

/// Loads a stock row the caller may act on.
///
/// Rows owned by someone else are reported as missing so user principals
/// cannot enumerate ids. Inactive rows are only returned when `include_inactive`.
pub async fn load_stock_for(
    state: &AppState,
    principal: &Principal,
    stock_id: Uuid,
    include_inactive: bool,
) -> Result<StockRecord, AppError> {
    let stock = state
        .stock_repo
        .get_stock(stock_id)
        .await
        .map_err(|err| {
            error!(stock_id = %stock_id, "failed to load stock: {}", err);
            AppError::Internal(err)
        })?;

    match stock {
        Some(stock) if principal.can_see(&stock.owner_id) && (include_inactive || stock.is_active) => {
            Ok(stock)
        }
        _ => Err(AppError::NotFound(format!("stock {} not found", stock_id))),
    }
}

pub async fn list_stock_audit(
    state: &AppState,
    principal: &Principal,
    stock_id: Uuid,
    query: AuditQuery,
) -> Result<Vec<AuditLogEntry>, AppError> {
    load_stock_for(state, principal, stock_id, true).await?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);
    let rows = state
        .stock_repo
        .list_audit(stock_id, limit)
        .await
        .map_err(|err| {
            error!(stock_id = %stock_id, "failed to fetch audit log: {}", err);
            AppError::Internal(err)
        })?;
    Ok(rows)
}
