use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{header, Client};
use tokio::sync::{Mutex, RwLock};

use crate::errors::{AppError, Result};
use crate::models::match_feed::Match;

struct CachedFeed {
    matches: Arc<Vec<Match>>,
    fetched_at: Instant,
}

/// Pulls the static match feed and keeps the whole payload in memory.
pub struct MatchesService {
    client: Client,
    feed_url: String,
    ttl: Duration,
    cache: RwLock<Option<CachedFeed>>,
    refresh: Mutex<()>,
}

impl MatchesService {
    pub fn new(feed_url: impl Into<String>, ttl: Duration, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            feed_url: feed_url.into(),
            ttl,
            cache: RwLock::new(None),
            refresh: Mutex::new(()),
        })
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn fetch_matches(&self) -> Result<Vec<Match>> {
        let response = self
            .client
            .get(&self.feed_url)
            .header(header::ACCEPT, "application/json")
            .header(header::CACHE_CONTROL, "max-age=0")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::external_api(format!(
                "Match feed returned status: {}",
                response.status()
            )));
        }

        let entries: Vec<serde_json::Value> = response.json().await?;
        Ok(parse_entries(entries))
    }

    /// Cached feed; on refresh failure serves the stale copy, or nothing.
    pub async fn matches(&self) -> Arc<Vec<Match>> {
        if let Some(fresh) = self.fresh_cache().await {
            return fresh;
        }

        // one refresh at a time; late arrivals reuse its result
        let _guard = self.refresh.lock().await;
        if let Some(fresh) = self.fresh_cache().await {
            return fresh;
        }

        match self.fetch_matches().await {
            Ok(matches) => {
                tracing::info!("✅ Fetched {} matches from feed", matches.len());
                let matches = Arc::new(matches);
                *self.cache.write().await = Some(CachedFeed {
                    matches: matches.clone(),
                    fetched_at: Instant::now(),
                });
                matches
            }
            Err(e) => {
                tracing::error!("❌ Error fetching matches: {}", e);
                match self.cache.read().await.as_ref() {
                    Some(stale) => {
                        tracing::warn!("⚠️ Serving {} stale matches", stale.matches.len());
                        stale.matches.clone()
                    }
                    None => Arc::new(Vec::new()),
                }
            }
        }
    }

    pub async fn find_match(&self, id: &str) -> Result<Match> {
        self.matches()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| AppError::MatchNotFound(id.to_string()))
    }

    pub async fn cached_count(&self) -> usize {
        self.cache
            .read()
            .await
            .as_ref()
            .map(|c| c.matches.len())
            .unwrap_or(0)
    }

    async fn fresh_cache(&self) -> Option<Arc<Vec<Match>>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| c.matches.clone())
    }
}

// One malformed entry is dropped on its own instead of hiding the whole feed.
fn parse_entries(entries: Vec<serde_json::Value>) -> Vec<Match> {
    let total = entries.len();
    let matches: Vec<Match> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Match>(entry) {
            Ok(game) => Some(game),
            Err(e) => {
                tracing::warn!("⚠️ Skipping feed entry {}: {}", index, e);
                None
            }
        })
        .collect();

    if matches.len() < total {
        tracing::warn!("⚠️ Kept {} of {} feed entries", matches.len(), total);
    }
    matches
}
