use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::commands::notification_commands::emit_discrepancy_notifications;
use crate::queries::discrepancy_queries::check_discrepancy;
use crate::queries::stock_queries::load_stock_for;
use crate::AppError;
use crate::AppState;
use backend_domain::services::plan_quantity;
use backend_domain::{
    normalize_marketplace, normalize_optional_text, AuditLogEntry, ChangeType, DiscrepancyDetail,
    LedgerWrite, Principal, QuantityChange, StockFieldUpdates, StockRecord, StockWrite, StoreError,
};

#[derive(Debug, Clone)]
pub struct MutateStockCommand {
    pub stock_id: Uuid,
    pub change_type: ChangeType,
    pub quantity: QuantityChange,
    pub fields: StockFieldUpdates,
    pub marketplace: Option<String>,
    pub performed_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MutateStockOutcome {
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub discrepancy: bool,
    pub quantity_clamped: bool,
    pub marketplaces_listed: Vec<String>,
    pub audit_id: Uuid,
    pub notifications_created: usize,
    pub stock: StockRecord,
}

fn resolve_performed_by(principal: &Principal, value: Option<String>) -> Result<String, AppError> {
    normalize_optional_text(value)
        .or_else(|| principal.user_id().map(str::to_string))
        .ok_or_else(|| AppError::Validation("performed_by is required".to_string()))
}

/// Applies one quantity change to a stock row and records it in the audit log.
///
/// Negative results clamp to zero and flag a discrepancy instead of failing.
pub async fn mutate_stock(
    state: &AppState,
    principal: &Principal,
    command: MutateStockCommand,
) -> Result<MutateStockOutcome, AppError> {
    let performed_by = resolve_performed_by(principal, command.performed_by)?;
    let stock = load_stock_for(state, principal, command.stock_id, false).await?;
    let marketplace = normalize_marketplace(command.marketplace);

    let plan = plan_quantity(stock.quantity, command.change_type, command.quantity);
    let check = check_discrepancy(state, stock.id, marketplace.as_deref()).await;
    let discrepancy = plan.clamped || check.discrepancy;

    let now = Utc::now();
    let write = LedgerWrite {
        stock: StockWrite {
            stock_id: stock.id,
            expected_version: stock.version,
            quantity: plan.after,
            is_active: stock.is_active && !plan.deactivate,
            fields: command.fields,
            updated_at: now,
        },
        audit: AuditLogEntry {
            id: Uuid::new_v4(),
            stock_id: stock.id,
            owner_id: stock.owner_id.clone(),
            quantity_before: plan.before,
            quantity_after: plan.after,
            change_type: command.change_type,
            performed_by,
            transaction_id: None,
            created_at: now,
        },
    };

    let updated = state
        .stock_repo
        .commit_mutation(&write)
        .await
        .map_err(|err| {
            if let StoreError::ConcurrentModification { .. } = err {
                state.metrics.record_ledger_conflict();
            }
            warn!(stock_id = %stock.id, "stock mutation rejected: {}", err);
            AppError::from(err)
        })?;
    state.metrics.record_stock_mutation(discrepancy);
    info!(
        stock_id = %stock.id,
        change_type = command.change_type.as_str(),
        before = plan.before,
        after = plan.after,
        clamped = plan.clamped,
        discrepancy,
        "stock mutated"
    );

    let lowered = plan.after < plan.before || plan.deactivate;
    let notifications_created = if lowered && check.discrepancy {
        let detail = DiscrepancyDetail {
            stock_id: stock.id,
            quantity_requested: plan.before - plan.after,
            quantity_before: plan.before,
            quantity_after: plan.after,
            quantity_clamped: plan.clamped,
            other_marketplaces: check.other_marketplaces.clone(),
            check_error: check.error.clone(),
        };
        match emit_discrepancy_notifications(
            state,
            &stock.owner_id,
            std::slice::from_ref(&detail),
            marketplace.as_deref(),
        )
        .await
        {
            Ok(count) => count,
            Err(err) => {
                warn!(stock_id = %stock.id, "discrepancy notifications failed: {}", err);
                0
            }
        }
    } else {
        0
    };

    Ok(MutateStockOutcome {
        quantity_before: plan.before,
        quantity_after: plan.after,
        discrepancy,
        quantity_clamped: plan.clamped,
        marketplaces_listed: check.other_marketplaces,
        audit_id: write.audit.id,
        notifications_created,
        stock: updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn performed_by_falls_back_to_user() {
        let user = Principal::User("seller-1".to_string());
        assert_eq!(
            resolve_performed_by(&user, None).expect("fallback"),
            "seller-1"
        );
        assert_eq!(
            resolve_performed_by(&user, Some(" clerk ".to_string())).expect("explicit"),
            "clerk"
        );
    }

    #[test]
    fn service_must_name_performer() {
        let err = resolve_performed_by(&Principal::Service, Some("  ".to_string()))
            .expect_err("blank performer");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
