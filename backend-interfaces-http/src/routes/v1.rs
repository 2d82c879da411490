use axum::routing::{get, post};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{
    notification_handlers, ops_handlers, price_handlers, stock_handlers, transaction_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/stock-update-operation",
            post(stock_handlers::stock_update_operation),
        )
        .route(
            "/v1/stock-transaction-operation",
            post(transaction_handlers::stock_transaction_operation),
        )
        .route("/v1/stock/:stock_id/audit", get(stock_handlers::stock_audit))
        .route(
            "/v1/stock/:stock_id/discrepancy",
            get(stock_handlers::stock_discrepancy),
        )
        .route(
            "/v1/daily-price-update",
            post(price_handlers::daily_price_update),
        )
        .route("/v1/prices/:core_card_id", get(price_handlers::get_card_price))
        .route(
            "/v1/prices/:core_card_id/refresh",
            post(price_handlers::refresh_card_price),
        )
        .route(
            "/v1/notifications",
            get(notification_handlers::list_notifications),
        )
        .route(
            "/v1/notifications/read",
            post(notification_handlers::mark_notifications_read),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
