use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use backend_application::{AppState, Metrics};
use backend_infrastructure::{
    continuation_channel, AppConfig, MarketPriceFetcher, MemoryStore, PgStore, ScryfallClient,
};

pub struct AppContext {
    pub state: AppState,
    /// Receiving end of the batch continuation channel, handed to the price worker.
    pub continuations: mpsc::Receiver<()>,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let fetcher = Arc::new(MarketPriceFetcher::new(ScryfallClient::new(
            &config.scryfall_base_url,
            runtime_config.request_timeout_seconds,
        )));
        let (continuation, continuations) = continuation_channel();
        let metrics = Arc::new(Metrics::default());

        let state = if db_config.database_url.is_some() {
            let store = Arc::new(PgStore::connect(&db_config).await?);
            store.ensure_schema().await?;
            info!(
                max_connections = db_config.max_connections,
                "using postgres store"
            );
            AppState {
                config: runtime_config,
                stock_repo: store.clone(),
                transaction_repo: store.clone(),
                listing_repo: store.clone(),
                notification_repo: store.clone(),
                price_queue_repo: store.clone(),
                card_repo: store,
                price_fetcher: fetcher,
                continuation: Arc::new(continuation),
                metrics,
            }
        } else {
            warn!("database_url not set, using in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            AppState {
                config: runtime_config,
                stock_repo: store.clone(),
                transaction_repo: store.clone(),
                listing_repo: store.clone(),
                notification_repo: store.clone(),
                price_queue_repo: store.clone(),
                card_repo: store,
                price_fetcher: fetcher,
                continuation: Arc::new(continuation),
                metrics,
            }
        };

        Ok(Self {
            state,
            continuations,
        })
    }
}
