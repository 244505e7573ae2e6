// src/database/vote_store.rs
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio::sync::Mutex;

use crate::errors::{AppError, Result};
use crate::models::poll::{NewPollVote, PollResults, PollVote, VotesFile};

#[async_trait]
pub trait PollStorage: Send + Sync {
    /// Rejects a second vote for the same (match, ip) with `AlreadyVoted`.
    async fn insert_vote(&self, vote: NewPollVote) -> Result<PollVote>;

    async fn poll_results(&self, match_id: &str) -> Result<PollResults>;

    async fn vote_by_match_and_ip(&self, match_id: &str, ip_address: &str)
        -> Result<Option<PollVote>>;

    async fn vote_count(&self) -> usize;
}

/// Votes kept in memory and mirrored to a JSON file.
///
/// One mutex covers the duplicate check, the append and the file rewrite, so
/// concurrent requests cannot both pass the check or interleave writes. The
/// file is replaced through a rename, never truncated in place.
pub struct VoteStore {
    path: Option<PathBuf>,
    inner: Mutex<VotesFile>,
}

impl VoteStore {
    pub fn in_memory() -> Self {
        VoteStore {
            path: None,
            inner: Mutex::new(VotesFile::default()),
        }
    }

    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let mut data = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<VotesFile>(&raw) {
                Ok(data) => {
                    tracing::info!("✅ Loaded {} votes from {}", data.votes.len(), path.display());
                    data
                }
                Err(e) => {
                    tracing::warn!("⚠️ {} is corrupted, starting with no votes: {}", path.display(), e);
                    VotesFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("📂 No votes file at {}, starting fresh", path.display());
                VotesFile::default()
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to read {}: {}", path.display(), e);
                VotesFile::default()
            }
        };

        // ids must stay unique even if lastVoteId was edited by hand
        let max_id = data.votes.iter().map(|v| v.id).max().unwrap_or(0);
        data.last_vote_id = data.last_vote_id.max(max_id);

        VoteStore {
            path: Some(path),
            inner: Mutex::new(data),
        }
    }

    async fn persist(&self, data: &VotesFile) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = temp_path(path);
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "votes.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl PollStorage for VoteStore {
    async fn insert_vote(&self, vote: NewPollVote) -> Result<PollVote> {
        let mut data = self.inner.lock().await;

        let duplicate = data
            .votes
            .iter()
            .any(|v| v.match_id == vote.match_id && v.ip_address == vote.ip_address);
        if duplicate {
            return Err(AppError::AlreadyVoted);
        }

        let stored = PollVote {
            id: data.last_vote_id + 1,
            match_id: vote.match_id,
            team_choice: vote.team_choice,
            ip_address: vote.ip_address,
            user_agent: vote.user_agent,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        data.votes.push(stored.clone());
        data.last_vote_id = stored.id;

        if let Err(e) = self.persist(&data).await {
            tracing::error!("❌ Error saving votes: {}", e);
            data.votes.pop();
            data.last_vote_id = stored.id - 1;
            return Err(e);
        }

        Ok(stored)
    }

    async fn poll_results(&self, match_id: &str) -> Result<PollResults> {
        let data = self.inner.lock().await;
        let mut results = PollResults::default();
        for vote in data.votes.iter().filter(|v| v.match_id == match_id) {
            results.record(vote.team_choice);
        }
        Ok(results)
    }

    async fn vote_by_match_and_ip(
        &self,
        match_id: &str,
        ip_address: &str,
    ) -> Result<Option<PollVote>> {
        let data = self.inner.lock().await;
        Ok(data
            .votes
            .iter()
            .find(|v| v.match_id == match_id && v.ip_address == ip_address)
            .cloned())
    }

    async fn vote_count(&self) -> usize {
        self.inner.lock().await.votes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::poll::TeamChoice;
    use std::sync::Arc;

    fn new_vote(match_id: &str, ip: &str, choice: TeamChoice) -> NewPollVote {
        NewPollVote {
            match_id: match_id.to_string(),
            team_choice: choice,
            ip_address: ip.to_string(),
            user_agent: "test-agent".to_string(),
        }
    }

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "livestream-api-store-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("votes.json")
    }

    #[tokio::test]
    async fn second_vote_from_same_ip_is_rejected() {
        let store = VoteStore::in_memory();
        store.insert_vote(new_vote("m1", "1.1.1.1", TeamChoice::Home)).await.unwrap();

        let err = store
            .insert_vote(new_vote("m1", "1.1.1.1", TeamChoice::Away))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyVoted));

        // Same IP on another match is fine
        store.insert_vote(new_vote("m2", "1.1.1.1", TeamChoice::Away)).await.unwrap();
        assert_eq!(store.vote_count().await, 2);
    }

    #[tokio::test]
    async fn ids_increase_and_results_stay_per_match() {
        let store = VoteStore::in_memory();
        let a = store.insert_vote(new_vote("m1", "a", TeamChoice::Home)).await.unwrap();
        let b = store.insert_vote(new_vote("m1", "b", TeamChoice::Draw)).await.unwrap();
        store.insert_vote(new_vote("m2", "c", TeamChoice::Away)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let m1 = store.poll_results("m1").await.unwrap();
        assert_eq!(m1, PollResults { home: 1, away: 0, draw: 1, total: 2 });

        let m2 = store.poll_results("m2").await.unwrap();
        assert_eq!(m2, PollResults { home: 0, away: 1, draw: 0, total: 1 });

        assert_eq!(store.poll_results("unknown").await.unwrap(), PollResults::default());
    }

    #[tokio::test]
    async fn concurrent_duplicates_accept_exactly_one() {
        let store = Arc::new(VoteStore::in_memory());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert_vote(new_vote("m1", "9.9.9.9", TeamChoice::Draw)).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.poll_results("m1").await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn votes_survive_reload() {
        let path = scratch_file("reload");
        {
            let store = VoteStore::load(&path).await;
            store.insert_vote(new_vote("m1", "a", TeamChoice::Home)).await.unwrap();
            store.insert_vote(new_vote("m1", "b", TeamChoice::Away)).await.unwrap();
        }

        let reloaded = VoteStore::load(&path).await;
        let results = reloaded.poll_results("m1").await.unwrap();
        assert_eq!(results.total, 2);

        let vote = reloaded.vote_by_match_and_ip("m1", "b").await.unwrap().unwrap();
        assert_eq!(vote.team_choice, TeamChoice::Away);

        // ids continue after the persisted lastVoteId
        let next = reloaded.insert_vote(new_vote("m1", "c", TeamChoice::Draw)).await.unwrap();
        assert_eq!(next.id, 3);
        assert!(!temp_path(&path).exists());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let path = scratch_file("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let store = VoteStore::load(&path).await;
        assert_eq!(store.vote_count().await, 0);

        let vote = store.insert_vote(new_vote("m1", "a", TeamChoice::Home)).await.unwrap();
        assert_eq!(vote.id, 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn failed_write_rolls_back_insert() {
        let path = scratch_file("blocked");
        let dir = path.parent().unwrap().to_path_buf();
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let store = VoteStore::load(blocker.join("votes.json")).await;
        let err = store
            .insert_vote(new_vote("m1", "a", TeamChoice::Home))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)), "{err:?}");

        assert_eq!(store.vote_count().await, 0);
        assert_eq!(store.poll_results("m1").await.unwrap().total, 0);
        assert!(store.vote_by_match_and_ip("m1", "a").await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn temp_path_sits_next_to_target() {
        let tmp = temp_path(Path::new("/data/votes.json"));
        assert_eq!(tmp, PathBuf::from("/data/votes.json.tmp"));
    }
}
