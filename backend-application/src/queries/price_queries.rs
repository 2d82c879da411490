use tracing::error;
use uuid::Uuid;

use crate::AppError;
use crate::AppState;
use backend_domain::PriceRecord;

pub async fn get_price(state: &AppState, core_card_id: Uuid) -> Result<PriceRecord, AppError> {
    let record = state
        .card_repo
        .get_price(core_card_id)
        .await
        .map_err(|err| {
            error!(core_card_id = %core_card_id, "failed to fetch price: {}", err);
            AppError::Internal(err)
        })?;
    record.ok_or_else(|| AppError::NotFound(format!("no price recorded for card {}", core_card_id)))
}
