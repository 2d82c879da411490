use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{DbConfig, RuntimeConfig};

use crate::config::validation::validate_base_url;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub log_dir: Option<String>,
    pub scryfall_base_url: String,
    pub price_batch_size: usize,
    pub price_batch_time_budget_seconds: u64,
    pub price_stale_claim_seconds: u64,
    pub price_max_attempts: i32,
    pub price_alert_threshold_percent: f64,
    pub price_request_interval_ms: u64,
    pub price_continuation_delay_ms: u64,
    pub price_refresh_hour: u32,
    pub price_refresh_minute: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            bind_addr: runtime.bind_addr,
            api_token: None,
            database_url: None,
            database_max_connections: 10,
            max_body_bytes: runtime.max_body_bytes,
            request_timeout_seconds: runtime.request_timeout_seconds,
            log_dir: None,
            scryfall_base_url: "https://api.scryfall.com".to_string(),
            price_batch_size: runtime.price_batch_size,
            price_batch_time_budget_seconds: runtime.price_batch_time_budget_seconds,
            price_stale_claim_seconds: runtime.price_stale_claim_seconds,
            price_max_attempts: runtime.price_max_attempts,
            price_alert_threshold_percent: runtime.price_alert_threshold_percent,
            price_request_interval_ms: runtime.price_request_interval_ms,
            price_continuation_delay_ms: runtime.price_continuation_delay_ms,
            price_refresh_hour: runtime.price_refresh_hour,
            price_refresh_minute: runtime.price_refresh_minute,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("STOCKWELL_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &str) -> Result<Self> {
        let file_path = Path::new(path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            toml::from_str(&content)?
        } else {
            warn!(path, "config file not found, using defaults");
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        self.api_token = blank_to_none(self.api_token.take());
        self.database_url = blank_to_none(self.database_url.take());
        self.log_dir = blank_to_none(self.log_dir.take());
        self.scryfall_base_url = self.scryfall_base_url.trim().trim_end_matches('/').to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        validate_base_url("scryfall_base_url", &self.scryfall_base_url)?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.database_max_connections == 0 {
            return Err(anyhow!("database_max_connections must be greater than 0"));
        }
        if self.price_batch_size == 0 {
            return Err(anyhow!("price_batch_size must be greater than 0"));
        }
        if self.price_batch_time_budget_seconds == 0 {
            return Err(anyhow!("price_batch_time_budget_seconds must be greater than 0"));
        }
        if self.price_batch_time_budget_seconds >= self.request_timeout_seconds {
            return Err(anyhow!(
                "price_batch_time_budget_seconds must be less than request_timeout_seconds"
            ));
        }
        if self.price_stale_claim_seconds <= self.request_timeout_seconds {
            return Err(anyhow!(
                "price_stale_claim_seconds must be greater than request_timeout_seconds"
            ));
        }
        if self.price_max_attempts <= 0 {
            return Err(anyhow!("price_max_attempts must be greater than 0"));
        }
        if !self.price_alert_threshold_percent.is_finite() || self.price_alert_threshold_percent < 0.0 {
            return Err(anyhow!("price_alert_threshold_percent must be a non-negative number"));
        }
        if self.price_refresh_hour > 23 || self.price_refresh_minute > 59 {
            return Err(anyhow!("price_refresh_hour or price_refresh_minute out of range"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            price_batch_size: self.price_batch_size,
            price_batch_time_budget_seconds: self.price_batch_time_budget_seconds,
            price_stale_claim_seconds: self.price_stale_claim_seconds,
            price_max_attempts: self.price_max_attempts,
            price_alert_threshold_percent: self.price_alert_threshold_percent,
            price_request_interval_ms: self.price_request_interval_ms,
            price_continuation_delay_ms: self.price_continuation_delay_ms,
            price_refresh_hour: self.price_refresh_hour,
            price_refresh_minute: self.price_refresh_minute,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("STOCKWELL_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("STOCKWELL_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("STOCKWELL_DATABASE_URL") {
            self.database_url = Some(value);
        }
        if let Ok(value) = env::var("STOCKWELL_DATABASE_MAX_CONNECTIONS") {
            self.database_max_connections = value.parse().unwrap_or(self.database_max_connections);
        }
        if let Ok(value) = env::var("STOCKWELL_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("STOCKWELL_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("STOCKWELL_LOG_DIR") {
            self.log_dir = Some(value);
        }
        if let Ok(value) = env::var("STOCKWELL_SCRYFALL_BASE_URL") {
            self.scryfall_base_url = value;
        }
        if let Ok(value) = env::var("STOCKWELL_PRICE_BATCH_SIZE") {
            self.price_batch_size = value.parse().unwrap_or(self.price_batch_size);
        }
        if let Ok(value) = env::var("STOCKWELL_PRICE_BATCH_TIME_BUDGET_SECONDS") {
            self.price_batch_time_budget_seconds =
                value.parse().unwrap_or(self.price_batch_time_budget_seconds);
        }
        if let Ok(value) = env::var("STOCKWELL_PRICE_STALE_CLAIM_SECONDS") {
            self.price_stale_claim_seconds = value.parse().unwrap_or(self.price_stale_claim_seconds);
        }
        if let Ok(value) = env::var("STOCKWELL_PRICE_MAX_ATTEMPTS") {
            self.price_max_attempts = value.parse().unwrap_or(self.price_max_attempts);
        }
        if let Ok(value) = env::var("STOCKWELL_PRICE_ALERT_THRESHOLD_PERCENT") {
            self.price_alert_threshold_percent =
                value.parse().unwrap_or(self.price_alert_threshold_percent);
        }
        if let Ok(value) = env::var("STOCKWELL_PRICE_REQUEST_INTERVAL_MS") {
            self.price_request_interval_ms = value.parse().unwrap_or(self.price_request_interval_ms);
        }
        if let Ok(value) = env::var("STOCKWELL_PRICE_CONTINUATION_DELAY_MS") {
            self.price_continuation_delay_ms =
                value.parse().unwrap_or(self.price_continuation_delay_ms);
        }
        if let Ok(value) = env::var("STOCKWELL_PRICE_REFRESH_HOUR") {
            self.price_refresh_hour = value.parse().unwrap_or(self.price_refresh_hour);
        }
        if let Ok(value) = env::var("STOCKWELL_PRICE_REFRESH_MINUTE") {
            self.price_refresh_minute = value.parse().unwrap_or(self.price_refresh_minute);
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|item| !item.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
