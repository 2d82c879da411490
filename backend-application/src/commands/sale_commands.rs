use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::commands::notification_commands::emit_discrepancy_notifications;
use crate::queries::discrepancy_queries::check_discrepancy;
use crate::queries::stock_queries::load_stock_for;
use crate::AppError;
use crate::AppState;
use backend_domain::services::plan_reduction;
use backend_domain::{
    normalize_marketplace, normalize_optional_text, AuditLogEntry, ChangeType, DiscrepancyDetail,
    LedgerWrite, Principal, SaleChangeType, SaleCommit, StockFieldUpdates, StockRecord,
    StockWrite, StoreError, Transaction, TransactionItem, TransactionType, IN_STORE_SOURCE,
};

#[derive(Debug, Clone)]
pub struct SaleLine {
    pub stock_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateSaleCommand {
    pub change_type: SaleChangeType,
    pub performed_by: Option<String>,
    pub marketplace: Option<String>,
    pub tax: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub net_amount: Option<Decimal>,
    pub idempotency_key: Option<String>,
    pub items: Vec<SaleLine>,
}

#[derive(Debug, Clone)]
pub struct SaleOutcome {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
    pub discrepancy: bool,
    pub discrepancy_details: Vec<DiscrepancyDetail>,
    pub replayed: bool,
    pub notifications_created: usize,
}

/// Money columns hold at most 12 integer digits and 2 decimal places.
fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

fn validate_amount(name: &str, value: Decimal) -> Result<(), AppError> {
    if value.normalize().scale() > 2 {
        return Err(AppError::Validation(format!(
            "{} must have at most 2 decimal places",
            name
        )));
    }
    if value > max_amount() {
        return Err(AppError::Validation(format!("{} is too large", name)));
    }
    Ok(())
}

fn checked_amount(value: Option<Decimal>) -> Result<Decimal, AppError> {
    value
        .filter(|amount| *amount <= max_amount())
        .ok_or_else(|| AppError::Validation("sale amount is too large".to_string()))
}

/// Sum of `quantity * unit_price` over the lines.
fn sale_subtotal(items: &[SaleLine]) -> Result<Decimal, AppError> {
    items.iter().try_fold(Decimal::ZERO, |subtotal, line| {
        checked_amount(
            Decimal::from(line.quantity)
                .checked_mul(line.unit_price)
                .and_then(|line_total| subtotal.checked_add(line_total)),
        )
    })
}

fn validate_sale(command: &CreateSaleCommand) -> Result<(), AppError> {
    if command.items.is_empty() {
        return Err(AppError::Validation("sale has no items".to_string()));
    }
    for (index, item) in command.items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "items[{}].quantity must be greater than 0",
                index
            )));
        }
        if item.unit_price.is_sign_negative() {
            return Err(AppError::Validation(format!(
                "items[{}].unit_price must not be negative",
                index
            )));
        }
        validate_amount(&format!("items[{}].unit_price", index), item.unit_price)?;
    }
    for (name, value) in [
        ("tax_amount", command.tax),
        ("shipping_amount", command.shipping),
        ("net_amount", command.net_amount),
    ] {
        let Some(value) = value else {
            continue;
        };
        if value.is_sign_negative() {
            return Err(AppError::Validation(format!("{} must not be negative", name)));
        }
        validate_amount(name, value)?;
    }
    if command.change_type == SaleChangeType::MarketplaceSale
        && normalize_marketplace(command.marketplace.clone()).is_none()
    {
        return Err(AppError::Validation(
            "marketplace is required for marketplace_sale".to_string(),
        ));
    }
    Ok(())
}

async fn find_replay(
    state: &AppState,
    principal: &Principal,
    key: &str,
) -> Result<Option<SaleOutcome>, AppError> {
    let existing = state
        .transaction_repo
        .find_by_idempotency_key(key)
        .await
        .map_err(|err| {
            error!("failed to look up idempotency key: {}", err);
            AppError::Internal(err)
        })?;
    let Some((transaction, items)) = existing else {
        return Ok(None);
    };
    if !principal.can_see(&transaction.owner_id) {
        return Err(AppError::Duplicate(
            "idempotency key already used".to_string(),
        ));
    }
    Ok(Some(SaleOutcome {
        transaction,
        items,
        discrepancy: false,
        discrepancy_details: Vec::new(),
        replayed: true,
        notifications_created: 0,
    }))
}

/// Records a sale: one ledger reduction per item plus the transaction rows,
/// all committed together or not at all.
///
/// Items run in order against the running state of each row, so a stock id
/// repeated within one sale is decremented once per line.
pub async fn create_sale_transaction(
    state: &AppState,
    principal: &Principal,
    command: CreateSaleCommand,
) -> Result<SaleOutcome, AppError> {
    validate_sale(&command)?;
    let subtotal = sale_subtotal(&command.items)?;
    let tax = command.tax.unwrap_or(Decimal::ZERO);
    let shipping = command.shipping.unwrap_or(Decimal::ZERO);
    let net_amount = match command.net_amount {
        Some(net_amount) => net_amount,
        None => checked_amount(
            subtotal
                .checked_add(tax)
                .and_then(|amount| amount.checked_add(shipping)),
        )?,
    };
    let performed_by = normalize_optional_text(command.performed_by.clone())
        .ok_or_else(|| AppError::Validation("performed_by is required".to_string()))?;
    let idempotency_key = normalize_optional_text(command.idempotency_key.clone());
    if let Some(key) = idempotency_key.as_deref() {
        if let Some(replay) = find_replay(state, principal, key).await? {
            info!(transaction_id = %replay.transaction.id, "sale replayed from idempotency key");
            return Ok(replay);
        }
    }

    let marketplace = normalize_marketplace(command.marketplace.clone());
    let transaction_id = Uuid::new_v4();
    let now = Utc::now();

    let mut working: HashMap<Uuid, StockRecord> = HashMap::new();
    let mut owner_id: Option<String> = None;
    let mut writes = Vec::with_capacity(command.items.len());
    let mut items = Vec::with_capacity(command.items.len());
    let mut details = Vec::new();

    for line in &command.items {
        let stock = match working.get(&line.stock_id) {
            Some(stock) => stock.clone(),
            None => load_stock_for(state, principal, line.stock_id, false).await?,
        };
        match owner_id.as_deref() {
            Some(owner) if owner != stock.owner_id => {
                error!(
                    transaction_id = %transaction_id,
                    stock_id = %stock.id,
                    "sale items resolve to different owners"
                );
                return Err(AppError::Integrity(
                    "sale items belong to different owners".to_string(),
                ));
            }
            Some(_) => {}
            None => owner_id = Some(stock.owner_id.clone()),
        }

        let plan = plan_reduction(stock.quantity, line.quantity);
        let check = check_discrepancy(state, stock.id, marketplace.as_deref()).await;

        if plan.clamped || check.discrepancy {
            details.push(DiscrepancyDetail {
                stock_id: stock.id,
                quantity_requested: line.quantity,
                quantity_before: plan.before,
                quantity_after: plan.after,
                quantity_clamped: plan.clamped,
                other_marketplaces: check.other_marketplaces.clone(),
                check_error: check.error.clone(),
            });
        }

        writes.push(LedgerWrite {
            stock: StockWrite {
                stock_id: stock.id,
                expected_version: stock.version,
                quantity: plan.after,
                is_active: stock.is_active,
                fields: StockFieldUpdates::default(),
                updated_at: now,
            },
            audit: AuditLogEntry {
                id: Uuid::new_v4(),
                stock_id: stock.id,
                owner_id: stock.owner_id.clone(),
                quantity_before: plan.before,
                quantity_after: plan.after,
                change_type: ChangeType::InventoryAdjustment,
                performed_by: performed_by.clone(),
                transaction_id: Some(transaction_id),
                created_at: now,
            },
        });
        items.push(TransactionItem {
            id: Uuid::new_v4(),
            transaction_id,
            stock_id: stock.id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        });

        let mut next = stock;
        next.quantity = plan.after;
        next.version += 1;
        next.updated_at = now;
        working.insert(next.id, next);
    }

    let owner_id = owner_id
        .ok_or_else(|| AppError::Integrity("sale resolved no stock owner".to_string()))?;
    let transaction = Transaction {
        id: transaction_id,
        owner_id: owner_id.clone(),
        transaction_type: TransactionType::Sale,
        source: marketplace
            .clone()
            .unwrap_or_else(|| IN_STORE_SOURCE.to_string()),
        is_integration: command.change_type.is_integration(),
        subtotal,
        tax,
        shipping,
        net_amount,
        performed_by,
        idempotency_key,
        created_at: now,
    };

    let commit = SaleCommit {
        transaction,
        items,
        writes,
    };
    state.stock_repo.commit_sale(&commit).await.map_err(|err| {
        if let StoreError::ConcurrentModification { .. } = err {
            state.metrics.record_ledger_conflict();
        }
        warn!(transaction_id = %transaction_id, "sale rejected: {}", err);
        AppError::from(err)
    })?;

    let discrepancy = !details.is_empty();
    state.metrics.record_sale(discrepancy);
    info!(
        transaction_id = %transaction_id,
        owner_id = %owner_id,
        lines = commit.items.len(),
        subtotal = %subtotal,
        discrepancy,
        "sale recorded"
    );

    let notifications_created = if discrepancy {
        match emit_discrepancy_notifications(state, &owner_id, &details, marketplace.as_deref())
            .await
        {
            Ok(count) => count,
            Err(err) => {
                warn!(transaction_id = %transaction_id, "discrepancy notifications failed: {}", err);
                0
            }
        }
    } else {
        0
    };

    let SaleCommit {
        transaction, items, ..
    } = commit;
    Ok(SaleOutcome {
        transaction,
        items,
        discrepancy,
        discrepancy_details: details,
        replayed: false,
        notifications_created,
    })
}
