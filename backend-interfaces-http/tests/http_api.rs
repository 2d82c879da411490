use std::io::Write;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use backend_application::{AppState, Metrics};
use backend_domain::ports::BatchContinuation;
use backend_domain::{Card, ExternalSource, RuntimeConfig, StockRecord};
use backend_infrastructure::{MarketPriceFetcher, MemoryStore, ScryfallClient};
use backend_interfaces_http::build_router;

struct NoContinuation;

impl BatchContinuation for NoContinuation {
    fn schedule_continuation(&self) {}
}

fn build_test_router(store: &MemoryStore, api_token: Option<&str>) -> Router {
    let shared = Arc::new(store.clone());
    let state = AppState {
        config: RuntimeConfig {
            api_token: api_token.map(str::to_string),
            price_request_interval_ms: 0,
            ..RuntimeConfig::default()
        },
        stock_repo: shared.clone(),
        transaction_repo: shared.clone(),
        listing_repo: shared.clone(),
        notification_repo: shared.clone(),
        price_queue_repo: shared.clone(),
        card_repo: shared,
        price_fetcher: Arc::new(MarketPriceFetcher::new(ScryfallClient::new(
            "http://127.0.0.1:9",
            1,
        ))),
        continuation: Arc::new(NoContinuation),
        metrics: Arc::new(Metrics::default()),
    };
    build_router(state)
}

async fn seed_stock(store: &MemoryStore, owner: &str, quantity: i32, listed_on: &[&str]) -> Uuid {
    let stock = StockRecord {
        id: Uuid::new_v4(),
        owner_id: owner.to_string(),
        core_card_id: Some(Uuid::new_v4()),
        quantity,
        condition: Some("LP".to_string()),
        language: Some("en".to_string()),
        sku: None,
        location: None,
        cost_basis: None,
        is_active: true,
        version: 0,
        updated_at: Utc::now(),
    };
    store.insert_stock(stock.clone()).await;
    for marketplace in listed_on {
        store.add_listing(stock.id, marketplace).await;
    }
    stock.id
}

fn post_json(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn stock_update_applies_delta_and_reports_listings() {
    let store = MemoryStore::new();
    let stock_id = seed_stock(&store, "seller-1", 5, &["tcgplayer", "cardmarket"]).await;
    let app = build_test_router(&store, None);

    let (status, body) = send(
        &app,
        post_json(
            "/v1/stock-update-operation",
            Some("seller-1"),
            json!({
                "stock_id": stock_id,
                "change_type": "manual_edit",
                "quantity_change": -2,
                "marketplace": "tcgplayer"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["quantity_before"], 5);
    assert_eq!(body["quantity_after"], 3);
    assert_eq!(body["discrepancy"], true);
    assert_eq!(body["marketplaces_listed"], json!(["cardmarket"]));
    assert_eq!(body["notifications_created"], 1);

    let (status, audit) = send(
        &app,
        get(&format!("/v1/stock/{}/audit", stock_id), Some("seller-1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit.as_array().map(Vec::len), Some(1));
    assert_eq!(audit[0]["change_type"], "manual_edit");
}

#[tokio::test]
async fn unknown_change_type_is_a_bad_request() {
    let store = MemoryStore::new();
    let stock_id = seed_stock(&store, "seller-1", 5, &[]).await;
    let app = build_test_router(&store, None);

    let (status, body) = send(
        &app,
        post_json(
            "/v1/stock-update-operation",
            Some("seller-1"),
            json!({"stock_id": stock_id, "change_type": "sale", "quantity_change": -1}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(store.stock(stock_id).await.unwrap().quantity, 5);
}

#[tokio::test]
async fn unknown_stock_is_not_found() {
    let store = MemoryStore::new();
    let app = build_test_router(&store, None);

    let (status, body) = send(
        &app,
        post_json(
            "/v1/stock-update-operation",
            None,
            json!({
                "stock_id": Uuid::new_v4(),
                "change_type": "manual_edit",
                "quantity_new": 1,
                "performed_by": "ops"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn gzipped_bodies_are_accepted() {
    let store = MemoryStore::new();
    let stock_id = seed_stock(&store, "seller-1", 5, &[]).await;
    let app = build_test_router(&store, None);

    let payload = json!({"stock_id": stock_id, "change_type": "manual_edit", "quantity_new": 9});
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload.to_string().as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/stock-update-operation")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_ENCODING, "gzip")
        .header("X-User-Id", "seller-1")
        .body(Body::from(compressed))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity_after"], 9);
}

#[tokio::test]
async fn sale_flags_discrepancy_and_notifies_the_seller() {
    let store = MemoryStore::new();
    let stock_id = seed_stock(&store, "seller-1", 5, &["tcgplayer", "cardmarket"]).await;
    let app = build_test_router(&store, None);

    let (status, body) = send(
        &app,
        post_json(
            "/v1/stock-transaction-operation",
            Some("seller-1"),
            json!({
                "change_type": "marketplace_sale",
                "marketplace": "TCGplayer",
                "idempotency_key": "tcg-order-1",
                "items": [{"stock_id": stock_id, "quantity": 5, "unit_price": 2.5}]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["discrepancy"], true);
    assert_eq!(body["replayed"], false);
    assert_eq!(body["notifications_created"], 1);
    assert_eq!(body["discrepancy_details"][0]["quantity_after"], 0);

    let (status, notifications) = send(&app, get("/v1/notifications", Some("seller-1"))).await;
    assert_eq!(status, StatusCode::OK);
    let rows = notifications.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["marketplace_id"], "cardmarket");
    let id = rows[0]["id"].clone();

    let (status, marked) = send(
        &app,
        post_json("/v1/notifications/read", Some("seller-1"), json!({"ids": [id]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["updated"], 1);

    let (_, unread) = send(
        &app,
        get("/v1/notifications?unread_only=true", Some("seller-1")),
    )
    .await;
    assert_eq!(unread.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn reused_idempotency_key_from_another_seller_is_rejected_softly() {
    let store = MemoryStore::new();
    let mine = seed_stock(&store, "seller-1", 5, &[]).await;
    let theirs = seed_stock(&store, "seller-2", 5, &[]).await;
    let app = build_test_router(&store, None);

    let sale = |stock_id: Uuid| {
        json!({
            "change_type": "sale",
            "idempotency_key": "k-1",
            "items": [{"stock_id": stock_id, "quantity": 1, "unit_price": 1}]
        })
    };
    let (status, _) = send(
        &app,
        post_json("/v1/stock-transaction-operation", Some("seller-1"), sale(mine)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_json("/v1/stock-transaction-operation", Some("seller-2"), sale(theirs)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "duplicate");
}

#[tokio::test]
async fn sub_cent_and_oversized_prices_are_rejected_before_any_write() {
    let store = MemoryStore::new();
    let stock_id = seed_stock(&store, "seller-1", 5, &[]).await;
    let app = build_test_router(&store, None);

    for unit_price in [json!(0.005), json!(1e20)] {
        let (status, body) = send(
            &app,
            post_json(
                "/v1/stock-transaction-operation",
                Some("seller-1"),
                json!({
                    "change_type": "sale",
                    "items": [{"stock_id": stock_id, "quantity": 2, "unit_price": unit_price}]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", unit_price);
        assert_eq!(body["code"], "validation_error");
    }

    let stock = store.stock(stock_id).await.expect("stock");
    assert_eq!(stock.quantity, 5);
    assert!(store.transactions().await.is_empty());
}

#[tokio::test]
async fn notifications_need_a_user() {
    let store = MemoryStore::new();
    let app = build_test_router(&store, None);
    let (status, body) = send(&app, get("/v1/notifications", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn api_token_guards_everything_but_health() {
    let store = MemoryStore::new();
    let app = build_test_router(&store, Some("secret"));

    let (status, body) = send(&app, get("/v1/notifications", Some("seller-1"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let request = Request::builder()
        .uri("/v1/notifications")
        .header("X-User-Id", "seller-1")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/v1/ops/health/live", None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/v1/ops/health/ready", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn daily_price_update_accepts_an_empty_body() {
    let store = MemoryStore::new();
    let app = build_test_router(&store, None);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/daily-price-update")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["processed"], 0);
    assert_eq!(body["remaining"], 0);
    assert_eq!(body["will_continue"], false);
}

#[tokio::test]
async fn price_lookup_and_refresh_errors() {
    let store = MemoryStore::new();
    let card = Card {
        id: Uuid::new_v4(),
        name: "Force of Will".to_string(),
        external_source: ExternalSource::Cardmarket,
        external_id: Some("fow".to_string()),
    };
    store.insert_card(card.clone()).await;
    let app = build_test_router(&store, None);

    let (status, body) = send(&app, get(&format!("/v1/prices/{}", card.id), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = send(
        &app,
        post_json(&format!("/v1/prices/{}/refresh", card.id), None, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "external_service_error");
}

#[tokio::test]
async fn metrics_are_exposed_as_prometheus_text() {
    let store = MemoryStore::new();
    let app = build_test_router(&store, None);

    let response = app
        .oneshot(get("/v1/ops/metrics/prometheus", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("stockwell_sales_total 0"));
}
