// Market price adapter.
// Scryfall is the only live source; cards sourced elsewhere fail as not implemented.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use backend_domain::ports::PriceFetcher;
use backend_domain::{Card, ExternalSource, PriceFetchError, PriceQuote};

const PROVIDER_ID: &str = "scryfall";
const USER_AGENT: &str = concat!("stockwell/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct CardResponse {
    #[serde(default)]
    prices: CardPrices,
}

#[derive(Debug, Default, Deserialize)]
struct CardPrices {
    usd: Option<String>,
    eur: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    details: Option<String>,
}

pub struct ScryfallClient {
    client: Client,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_card_prices(&self, external_id: &str) -> Result<PriceQuote, PriceFetchError> {
        let url = format!("{}/cards/{}", self.base_url, external_id);
        debug!(url = %url, "scryfall request");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    PriceFetchError::Timeout(PROVIDER_ID.to_string())
                } else {
                    PriceFetchError::Provider {
                        provider: PROVIDER_ID.to_string(),
                        message: format!("request failed: {}", err),
                    }
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceFetchError::RateLimited(PROVIDER_ID.to_string()));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(PriceFetchError::CardNotFound {
                provider: PROVIDER_ID.to_string(),
                external_id: external_id.to_string(),
            });
        }

        let body = response.text().await.map_err(|err| PriceFetchError::Provider {
            provider: PROVIDER_ID.to_string(),
            message: format!("failed to read response: {}", err),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|resp| resp.details)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(PriceFetchError::Provider {
                provider: PROVIDER_ID.to_string(),
                message,
            });
        }

        parse_card_prices(&body)
    }
}

/// Maps a Scryfall card body to a quote: `usd` is the TCGplayer price, `eur` the Cardmarket price.
pub fn parse_card_prices(body: &str) -> Result<PriceQuote, PriceFetchError> {
    let card: CardResponse = serde_json::from_str(body).map_err(|err| PriceFetchError::Provider {
        provider: PROVIDER_ID.to_string(),
        message: format!("invalid card payload: {}", err),
    })?;
    Ok(PriceQuote {
        tcgplayer_price: parse_price(card.prices.usd.as_deref()),
        cardmarket_price: parse_price(card.prices.eur.as_deref()),
    })
}

fn parse_price(value: Option<&str>) -> Option<Decimal> {
    let raw = value?.trim();
    match Decimal::from_str(raw) {
        Ok(price) if !price.is_sign_negative() => Some(price),
        Ok(_) => None,
        Err(err) => {
            warn!(value = raw, "unparseable scryfall price: {}", err);
            None
        }
    }
}

/// Routes each card to the adapter for its `external_source`.
pub struct MarketPriceFetcher {
    scryfall: ScryfallClient,
}

impl MarketPriceFetcher {
    pub fn new(scryfall: ScryfallClient) -> Self {
        Self { scryfall }
    }
}

#[async_trait]
impl PriceFetcher for MarketPriceFetcher {
    async fn fetch_prices(&self, card: &Card) -> Result<PriceQuote, PriceFetchError> {
        match card.external_source {
            ExternalSource::Scryfall => {
                let external_id = card
                    .external_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or(PriceFetchError::MissingExternalId(card.id))?;
                self.scryfall.fetch_card_prices(external_id).await
            }
            source @ (ExternalSource::Tcgplayer | ExternalSource::Cardmarket) => {
                Err(PriceFetchError::NotImplemented(source))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn parses_usd_and_eur_prices() {
        let body = r#"{
            "object": "card",
            "id": "0000579f-7b35-4ed3-b44c-db2a538066fe",
            "name": "Fury Sliver",
            "prices": {"usd": "0.29", "usd_foil": null, "eur": "0.12", "tix": "0.02"}
        }"#;
        let quote = parse_card_prices(body).expect("parse");
        assert_eq!(quote.tcgplayer_price, Some(dec!(0.29)));
        assert_eq!(quote.cardmarket_price, Some(dec!(0.12)));
    }

    #[test]
    fn missing_prices_stay_empty() {
        let quote = parse_card_prices(r#"{"object": "card", "prices": {"usd": null}}"#)
            .expect("parse");
        assert_eq!(quote, PriceQuote::default());

        let quote = parse_card_prices(r#"{"object": "card"}"#).expect("parse without prices");
        assert_eq!(quote, PriceQuote::default());
    }

    #[test]
    fn garbage_price_is_dropped() {
        let quote = parse_card_prices(r#"{"prices": {"usd": "n/a", "eur": "1.50"}}"#)
            .expect("parse");
        assert_eq!(quote.tcgplayer_price, None);
        assert_eq!(quote.cardmarket_price, Some(dec!(1.50)));
    }

    #[tokio::test]
    async fn non_scryfall_sources_are_not_implemented() {
        let fetcher = MarketPriceFetcher::new(ScryfallClient::new("http://127.0.0.1:9", 1));
        for source in [ExternalSource::Tcgplayer, ExternalSource::Cardmarket] {
            let card = Card {
                id: Uuid::new_v4(),
                name: "Lightning Bolt".to_string(),
                external_source: source,
                external_id: Some("abc".to_string()),
            };
            let err = fetcher.fetch_prices(&card).await.expect_err("not implemented");
            assert!(matches!(err, PriceFetchError::NotImplemented(s) if s == source));
        }
    }

    #[tokio::test]
    async fn scryfall_card_without_external_id_fails() {
        let fetcher = MarketPriceFetcher::new(ScryfallClient::new("http://127.0.0.1:9", 1));
        let card = Card {
            id: Uuid::new_v4(),
            name: "Counterspell".to_string(),
            external_source: ExternalSource::Scryfall,
            external_id: None,
        };
        let err = fetcher.fetch_prices(&card).await.expect_err("missing id");
        assert!(matches!(err, PriceFetchError::MissingExternalId(_)));
    }
}
