use crate::database::PollStorage;
use crate::errors::{AppError, Result};
use crate::middleware::client_ip::ClientIdentity;
use crate::models::poll::{NewPollVote, PollResults, PollVote, TeamChoice, UserVoteStatus};

pub const MAX_MATCH_ID_LEN: usize = 128;

pub fn validate_match_id(match_id: &str) -> Result<()> {
    if match_id.trim().is_empty() {
        return Err(AppError::invalid_data("Match ID is required"));
    }
    if match_id.len() > MAX_MATCH_ID_LEN {
        return Err(AppError::invalid_data("Match ID is too long"));
    }
    Ok(())
}

/// Records one vote per (match, caller IP).
///
/// The duplicate check runs before the choice is validated, so a repeat
/// voter always sees "already voted".
pub async fn submit_vote(
    storage: &dyn PollStorage,
    match_id: &str,
    team_choice: &str,
    identity: &ClientIdentity,
) -> Result<PollVote> {
    validate_match_id(match_id)?;

    if storage
        .vote_by_match_and_ip(match_id, &identity.ip_address)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyVoted);
    }

    let team_choice: TeamChoice = team_choice.parse()?;

    let vote = storage
        .insert_vote(NewPollVote {
            match_id: match_id.to_string(),
            team_choice,
            ip_address: identity.ip_address.clone(),
            user_agent: identity.user_agent.clone(),
        })
        .await?;

    tracing::info!(
        "🗳️ Vote #{} recorded: match={} choice={} ip={}",
        vote.id,
        vote.match_id,
        vote.team_choice,
        vote.ip_address
    );

    Ok(vote)
}

pub async fn get_results(storage: &dyn PollStorage, match_id: &str) -> Result<PollResults> {
    validate_match_id(match_id)?;
    storage.poll_results(match_id).await
}

pub async fn get_user_vote(
    storage: &dyn PollStorage,
    match_id: &str,
    identity: &ClientIdentity,
) -> Result<UserVoteStatus> {
    validate_match_id(match_id)?;
    let vote = storage
        .vote_by_match_and_ip(match_id, &identity.ip_address)
        .await?;

    Ok(UserVoteStatus {
        has_voted: vote.is_some(),
        team_choice: vote.map(|v| v.team_choice),
    })
}
