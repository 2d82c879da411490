#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use backend_application::{AppState, Metrics};
use backend_domain::ports::{BatchContinuation, ListingRepository, PriceFetcher};
use backend_domain::{
    Card, ExternalSource, MarketplaceListing, PriceFetchError, PriceQuote, RuntimeConfig,
    StockRecord,
};
use backend_infrastructure::MemoryStore;

pub const OWNER: &str = "seller-1";

/// Serves canned quotes for Scryfall cards and refuses every other source.
#[derive(Default)]
pub struct FakeFetcher {
    quotes: Mutex<HashMap<Uuid, PriceQuote>>,
    calls: AtomicUsize,
    delay_ms: AtomicU64,
}

impl FakeFetcher {
    pub fn set_quote(&self, card_id: Uuid, quote: PriceQuote) {
        self.quotes
            .lock()
            .expect("quotes lock")
            .insert(card_id, quote);
    }

    /// Every later fetch sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFetcher for FakeFetcher {
    async fn fetch_prices(&self, card: &Card) -> Result<PriceQuote, PriceFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if card.external_source != ExternalSource::Scryfall {
            return Err(PriceFetchError::NotImplemented(card.external_source));
        }
        self.quotes
            .lock()
            .expect("quotes lock")
            .get(&card.id)
            .copied()
            .ok_or_else(|| PriceFetchError::Provider {
                provider: "fake".to_string(),
                message: format!("no quote for {}", card.id),
            })
    }
}

#[derive(Default)]
pub struct RecordingContinuation {
    scheduled: AtomicUsize,
}

impl RecordingContinuation {
    pub fn count(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }
}

impl BatchContinuation for RecordingContinuation {
    fn schedule_continuation(&self) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
    }
}

/// Listing lookups that always fail.
pub struct BrokenListings;

#[async_trait]
impl ListingRepository for BrokenListings {
    async fn list_listings(&self, _stock_id: Uuid) -> anyhow::Result<Vec<MarketplaceListing>> {
        Err(anyhow::anyhow!("listing table unavailable"))
    }
}

/// Fails the first `failures` listing lookups, then reads from the store.
pub struct FlakyListings {
    store: MemoryStore,
    failures: AtomicUsize,
}

#[async_trait]
impl ListingRepository for FlakyListings {
    async fn list_listings(&self, stock_id: Uuid) -> anyhow::Result<Vec<MarketplaceListing>> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(anyhow::anyhow!("listing lookup timed out"));
        }
        self.store.list_listings(stock_id).await
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub fetcher: Arc<FakeFetcher>,
    pub continuation: Arc<RecordingContinuation>,
    pub state: AppState,
}

pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        price_batch_size: 10,
        price_request_interval_ms: 0,
        price_continuation_delay_ms: 0,
        ..RuntimeConfig::default()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let store = MemoryStore::new();
        let fetcher = Arc::new(FakeFetcher::default());
        let continuation = Arc::new(RecordingContinuation::default());
        let shared = Arc::new(store.clone());
        let state = AppState {
            config,
            stock_repo: shared.clone(),
            transaction_repo: shared.clone(),
            listing_repo: shared.clone(),
            notification_repo: shared.clone(),
            price_queue_repo: shared.clone(),
            card_repo: shared,
            price_fetcher: fetcher.clone(),
            continuation: continuation.clone(),
            metrics: Arc::new(Metrics::default()),
        };
        Self {
            store,
            fetcher,
            continuation,
            state,
        }
    }

    pub fn with_broken_listings(mut self) -> Self {
        self.state.listing_repo = Arc::new(BrokenListings);
        self
    }

    pub fn with_flaky_listings(mut self, failures: usize) -> Self {
        self.state.listing_repo = Arc::new(FlakyListings {
            store: self.store.clone(),
            failures: AtomicUsize::new(failures),
        });
        self
    }

    /// Inserts an active stock row and its marketplace listings.
    pub async fn seed_stock(&self, owner: &str, quantity: i32, listed_on: &[&str]) -> StockRecord {
        let stock = stock_row(owner, quantity);
        self.store.insert_stock(stock.clone()).await;
        for marketplace in listed_on {
            self.store.add_listing(stock.id, marketplace).await;
        }
        stock
    }

    pub async fn seed_card(&self, name: &str, source: ExternalSource) -> Card {
        let card = Card {
            id: Uuid::new_v4(),
            name: name.to_string(),
            external_source: source,
            external_id: Some(Uuid::new_v4().to_string()),
        };
        self.store.insert_card(card.clone()).await;
        card
    }
}

pub fn stock_row(owner: &str, quantity: i32) -> StockRecord {
    StockRecord {
        id: Uuid::new_v4(),
        owner_id: owner.to_string(),
        core_card_id: Some(Uuid::new_v4()),
        quantity,
        condition: Some("NM".to_string()),
        language: Some("en".to_string()),
        sku: None,
        location: None,
        cost_basis: None,
        is_active: true,
        version: 0,
        updated_at: Utc::now(),
    }
}
