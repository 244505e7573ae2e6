use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use validator::Validate;

use crate::{
    errors::{AppError, Result},
    middleware::client_ip::ClientIdentity,
    models::poll::{PollResults, SubmitVoteRequest, UserVoteStatus, VoteSubmitted},
    services::poll_service,
    state::AppState,
};

pub async fn submit_vote(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    identity: ClientIdentity,
    payload: std::result::Result<Json<SubmitVoteRequest>, JsonRejection>,
) -> Result<Json<VoteSubmitted>> {
    tracing::info!("🗳️ POST /api/polls/{}/vote from {}", match_id, identity.ip_address);

    let Json(payload) = payload.map_err(|e| {
        tracing::warn!("❌ Rejected vote body: {}", e);
        AppError::invalid_data("Invalid request body")
    })?;

    // a missing choice is a malformed request, not a vote
    payload.validate()?;

    let result = poll_service::submit_vote(
        state.polls.as_ref(),
        &match_id,
        &payload.team_choice,
        &identity,
    )
    .await;

    match result {
        Ok(_) => Ok(Json(VoteSubmitted { success: true })),
        Err(e @ (AppError::AlreadyVoted | AppError::InvalidChoice | AppError::ValidationError(_))) => {
            tracing::info!("❌ Vote rejected for {}: {}", match_id, e);
            Err(e)
        }
        Err(e) => {
            tracing::error!("❌ Error submitting vote: {}", e);
            Err(AppError::service("Failed to submit vote"))
        }
    }
}

pub async fn get_results(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<PollResults>> {
    tracing::debug!("📊 GET /api/polls/{}/results", match_id);

    poll_service::get_results(state.polls.as_ref(), &match_id)
        .await
        .map(Json)
        .map_err(|e| match e {
            AppError::ValidationError(_) => e,
            other => {
                tracing::error!("❌ Error fetching poll results: {}", other);
                AppError::service("Failed to fetch poll results")
            }
        })
}

pub async fn get_user_vote(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    identity: ClientIdentity,
) -> Result<Json<UserVoteStatus>> {
    tracing::debug!("🔍 GET /api/polls/{}/user-vote for {}", match_id, identity.ip_address);

    poll_service::get_user_vote(state.polls.as_ref(), &match_id, &identity)
        .await
        .map(Json)
        .map_err(|e| match e {
            AppError::ValidationError(_) => e,
            other => {
                tracing::error!("❌ Error checking user vote: {}", other);
                AppError::service("Failed to check user vote")
            }
        })
}
