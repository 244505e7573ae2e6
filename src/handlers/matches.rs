use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;

use crate::errors::Result;
use crate::models::match_feed::{Match, MatchQuery, StreamSource};
use crate::services::playback::{check_streams, StreamCheck};
use crate::state::AppState;

pub async fn get_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<Vec<Match>>> {
    tracing::debug!("🔍 GET /api/matches called with query: {:?}", query);
    let start_time = std::time::Instant::now();

    let now = Utc::now();
    let matches: Vec<Match> = state
        .matches
        .matches()
        .await
        .iter()
        .filter(|m| query.matches(m, now))
        .cloned()
        .collect();

    tracing::debug!("✅ Returning {} matches in {:?}", matches.len(), start_time.elapsed());
    Ok(Json(matches))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Match>> {
    tracing::debug!("🔍 GET /api/matches/{} called", id);
    state.matches.find_match(&id).await.map(Json)
}

pub async fn get_match_streams(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StreamSource>>> {
    let game = state.matches.find_match(&id).await?;
    Ok(Json(game.stream_sources()))
}

pub async fn check_match_streams(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StreamCheck>>> {
    tracing::info!("📡 Checking streams for match {}", id);
    let start_time = std::time::Instant::now();

    let game = state.matches.find_match(&id).await?;
    let checks = check_streams(
        state.matches.client(),
        game.stream_sources(),
        state.retry_policy(),
        state.config.stream_check_timeout,
    )
    .await;

    tracing::info!(
        "✅ Checked {} streams for {} vs {} in {:?}",
        checks.len(),
        game.clubs.home.name,
        game.clubs.away.name,
        start_time.elapsed()
    );
    Ok(Json(checks))
}
