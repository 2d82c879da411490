use std::sync::Arc;

use backend_domain::ports::{
    BatchContinuation, CardRepository, ListingRepository, NotificationRepository, PriceFetcher,
    PriceQueueRepository, StockRepository, TransactionRepository,
};
use backend_domain::RuntimeConfig;

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub stock_repo: Arc<dyn StockRepository>,
    pub transaction_repo: Arc<dyn TransactionRepository>,
    pub listing_repo: Arc<dyn ListingRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub price_queue_repo: Arc<dyn PriceQueueRepository>,
    pub card_repo: Arc<dyn CardRepository>,
    pub price_fetcher: Arc<dyn PriceFetcher>,
    pub continuation: Arc<dyn BatchContinuation>,
    pub metrics: Arc<Metrics>,
}
