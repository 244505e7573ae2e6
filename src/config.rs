// config.rs
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{AppError, Result};

pub const DEFAULT_MATCHES_FEED_URL: &str =
    "https://www.googleapis.com/drive/v3/files/1KMNMacr7lkJ2KF9wBvsfnOvIGtiqkSu9?alt=media";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub votes_file: PathBuf,
    pub matches_feed_url: String,
    pub matches_cache_ttl: Duration,
    pub feed_timeout: Duration,
    pub player_retry_base: Duration,
    pub player_max_attempts: u32,
    pub stream_check_timeout: Duration,
    pub trust_proxy_headers: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 10000,
            votes_file: PathBuf::from("votes.json"),
            matches_feed_url: DEFAULT_MATCHES_FEED_URL.to_string(),
            matches_cache_ttl: Duration::from_secs(60),
            feed_timeout: Duration::from_secs(15),
            player_retry_base: Duration::from_millis(2000),
            player_max_attempts: 5,
            stream_check_timeout: Duration::from_secs(30),
            trust_proxy_headers: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = AppConfig::default();

        let config = AppConfig {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            votes_file: env::var("VOTES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.votes_file),
            matches_feed_url: env::var("MATCHES_FEED_URL").unwrap_or(defaults.matches_feed_url),
            matches_cache_ttl: Duration::from_secs(parse_var("MATCHES_CACHE_TTL_SECS", 60)?),
            feed_timeout: Duration::from_secs(parse_var("FEED_TIMEOUT_SECS", 15)?),
            player_retry_base: Duration::from_millis(parse_var("PLAYER_RETRY_BASE_MS", 2000)?),
            player_max_attempts: parse_var("PLAYER_MAX_ATTEMPTS", defaults.player_max_attempts)?,
            stream_check_timeout: Duration::from_secs(parse_var("STREAM_CHECK_TIMEOUT_SECS", 30)?),
            trust_proxy_headers: parse_var("TRUST_PROXY_HEADERS", defaults.trust_proxy_headers)?,
        };

        tracing::info!("📁 Votes file: {}", config.votes_file.display());
        tracing::info!("🌐 Matches feed: {}", config.matches_feed_url);

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "host": self.host,
            "port": self.port,
            "votes_file": self.votes_file.display().to_string(),
            "matches_feed_configured": !self.matches_feed_url.is_empty(),
            "matches_cache_ttl_secs": self.matches_cache_ttl.as_secs(),
            "player_retry_base_ms": self.player_retry_base.as_millis() as u64,
            "player_max_attempts": self.player_max_attempts,
            "stream_check_timeout_secs": self.stream_check_timeout.as_secs(),
            "trust_proxy_headers": self.trust_proxy_headers,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AppError::configuration(format!("{} has an invalid value: '{}'", name, raw))
        }),
        Err(_) => Ok(default),
    }
}
