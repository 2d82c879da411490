// Runtime settings handed from infrastructure config to the application

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub price_batch_size: usize,
    pub price_batch_time_budget_seconds: u64,
    /// A `processing` claim older than this is treated as abandoned.
    pub price_stale_claim_seconds: u64,
    pub price_max_attempts: i32,
    pub price_alert_threshold_percent: f64,
    pub price_request_interval_ms: u64,
    pub price_continuation_delay_ms: u64,
    pub price_refresh_hour: u32,
    pub price_refresh_minute: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            max_body_bytes: 2 * 1024 * 1024,
            request_timeout_seconds: 60,
            price_batch_size: 50,
            price_batch_time_budget_seconds: 50,
            price_stale_claim_seconds: 300,
            price_max_attempts: 3,
            price_alert_threshold_percent: 0.0,
            price_request_interval_ms: 100,
            price_continuation_delay_ms: 1000,
            price_refresh_hour: 3,
            price_refresh_minute: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
}
