use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::polls;
use crate::state::AppState;

pub fn poll_routes() -> Router<AppState> {
    Router::new()
        .route("/:match_id/vote", post(polls::submit_vote))
        .route("/:match_id/results", get(polls::get_results))
        .route("/:match_id/user-vote", get(polls::get_user_vote))
}
