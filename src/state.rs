use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{PollStorage, VoteStore};
use crate::errors::Result;
use crate::services::matches_service::MatchesService;
use crate::services::playback::RetryPolicy;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub polls: Arc<dyn PollStorage>,
    pub matches: Arc<MatchesService>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let polls = VoteStore::load(config.votes_file.clone()).await;
        let matches = MatchesService::new(
            config.matches_feed_url.clone(),
            config.matches_cache_ttl,
            config.feed_timeout,
        )?;

        Ok(AppState {
            config: Arc::new(config),
            polls: Arc::new(polls),
            matches: Arc::new(matches),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.player_retry_base, self.config.player_max_attempts)
    }
}
