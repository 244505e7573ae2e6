// src/models/poll.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::AppError;

/// A single prediction for a match outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamChoice {
    Home,
    Away,
    Draw,
}

impl TeamChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamChoice::Home => "home",
            TeamChoice::Away => "away",
            TeamChoice::Draw => "draw",
        }
    }
}

impl fmt::Display for TeamChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamChoice {
    type Err = AppError;

    // Exact match only: "Home" or " home" are rejected like any other value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(TeamChoice::Home),
            "away" => Ok(TeamChoice::Away),
            "draw" => Ok(TeamChoice::Draw),
            _ => Err(AppError::InvalidChoice),
        }
    }
}

// Stored vote, as persisted in votes.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollVote {
    pub id: u64,
    pub match_id: String,
    pub team_choice: TeamChoice,
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: String,
    pub created_at: String,
}

// Vote about to be inserted; the store assigns id and createdAt
#[derive(Debug, Clone)]
pub struct NewPollVote {
    pub match_id: String,
    pub team_choice: TeamChoice,
    pub ip_address: String,
    pub user_agent: String,
}

// Body of POST /api/polls/:matchId/vote
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitVoteRequest {
    #[serde(rename = "teamChoice", default)]
    #[validate(length(min = 1, message = "Team choice is required"))]
    pub team_choice: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResults {
    pub home: u64,
    pub away: u64,
    pub draw: u64,
    pub total: u64,
}

impl PollResults {
    pub fn record(&mut self, choice: TeamChoice) {
        match choice {
            TeamChoice::Home => self.home += 1,
            TeamChoice::Away => self.away += 1,
            TeamChoice::Draw => self.draw += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteSubmitted {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserVoteStatus {
    #[serde(rename = "hasVoted")]
    pub has_voted: bool,

    #[serde(rename = "teamChoice")]
    pub team_choice: Option<TeamChoice>,
}

// File layout of votes.json
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesFile {
    #[serde(default)]
    pub votes: Vec<PollVote>,
    #[serde(default)]
    pub last_vote_id: u64,
}
