use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root_handler() -> &'static str {
    "⚽ Football Livestream API"
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "votes": state.polls.vote_count().await,
        "cached_matches": state.matches.cached_count().await,
        "matches_feed": !state.matches.feed_url().is_empty(),
        "config": state.config.get_config_info(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
