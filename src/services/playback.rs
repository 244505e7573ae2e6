//! Bounded-retry supervision around a stream player.
//!
//! A [`StreamPlayer`] is (re)built for a [`StreamSource`]; fatal failures are
//! retried with exponential backoff until the policy gives up. State changes
//! are published on a `watch` channel so callers can render
//! loading / playing / retrying / error.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::models::match_feed::StreamSource;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const BACKOFF_FACTOR: f64 = 1.5;
pub const TERMINAL_ERROR: &str = "Stream connection failed after multiple attempts";
pub const CHECK_TIMEOUT_ERROR: &str = "Stream check timed out";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub factor: f64,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        RetryPolicy {
            base_delay,
            factor: BACKOFF_FACTOR,
            max_attempts,
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.mul_f64(self.factor.powi(attempt as i32))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PlaybackState {
    Loading,
    Playing,
    Retrying {
        attempt: u32,
        #[serde(rename = "delayMs")]
        delay_ms: u64,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerErrorKind {
    Network,
    Media,
    Other,
}

#[derive(Debug, Clone, Error)]
#[error("{kind:?} player error (fatal: {fatal}): {details}")]
pub struct PlayerError {
    pub kind: PlayerErrorKind,
    pub fatal: bool,
    pub details: String,
}

impl PlayerError {
    pub fn fatal(kind: PlayerErrorKind, details: impl Into<String>) -> Self {
        PlayerError { kind, fatal: true, details: details.into() }
    }

    pub fn non_fatal(kind: PlayerErrorKind, details: impl Into<String>) -> Self {
        PlayerError { kind, fatal: false, details: details.into() }
    }

    // Buffer append failures surface as network errors but recover like media ones
    fn is_media_recoverable(&self) -> bool {
        match self.kind {
            PlayerErrorKind::Media => true,
            PlayerErrorKind::Network => self.details == "bufferAppendError",
            PlayerErrorKind::Other => false,
        }
    }
}

#[async_trait]
pub trait StreamPlayer: Send {
    async fn start(&mut self, source: &StreamSource) -> Result<(), PlayerError>;

    async fn recover_media_error(&mut self) -> Result<(), PlayerError>;

    async fn destroy(&mut self);
}

pub struct PlaybackSupervisor<P> {
    player: P,
    policy: RetryPolicy,
    attempts: u32,
    total_retries: u32,
    state: watch::Sender<PlaybackState>,
    cancel: CancellationToken,
}

impl<P: StreamPlayer> PlaybackSupervisor<P> {
    pub fn new(player: P, policy: RetryPolicy) -> Self {
        let (state, _) = watch::channel(PlaybackState::Loading);
        PlaybackSupervisor {
            player,
            policy,
            attempts: 0,
            total_retries: 0,
            state,
            cancel: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Retries across all runs; unlike `attempts` this never resets.
    pub fn total_retries(&self) -> u32 {
        self.total_retries
    }

    pub fn state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Starts playback and keeps rebuilding the player on fatal errors.
    /// Returns once playing, exhausted or cancelled.
    pub async fn run(&mut self, source: &StreamSource) -> PlaybackState {
        loop {
            if self.cancel.is_cancelled() {
                return self.state();
            }

            self.publish(PlaybackState::Loading);

            let err = match self.player.start(source).await {
                Ok(()) => return self.playing(),
                Err(err) if !err.fatal => {
                    tracing::debug!("Non-fatal player error on {}: {}", source.url, err);
                    return self.playing();
                }
                Err(err) => err,
            };

            tracing::warn!("⚠️ Fatal player error on {}: {}", source.url, err);

            if err.is_media_recoverable() {
                match self.player.recover_media_error().await {
                    Ok(()) => return self.playing(),
                    Err(e) => tracing::warn!("Media recovery failed: {}", e),
                }
            }

            if self.attempts >= self.policy.max_attempts {
                self.player.destroy().await;
                let failed = PlaybackState::Error { message: TERMINAL_ERROR.to_string() };
                self.publish(failed.clone());
                tracing::error!("❌ {} ({})", TERMINAL_ERROR, source.url);
                return failed;
            }

            let delay = self.policy.delay_for(self.attempts);
            self.attempts += 1;
            self.total_retries += 1;
            self.publish(PlaybackState::Retrying {
                attempt: self.attempts,
                delay_ms: delay.as_millis() as u64,
            });
            tracing::info!(
                "🔄 Retry attempt {}/{} for {} in {:?}",
                self.attempts,
                self.policy.max_attempts,
                source.url,
                delay
            );

            self.player.destroy().await;

            tokio::select! {
                _ = self.cancel.cancelled() => return self.state(),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Manual retry: resets the attempt counter and replaces a cancelled
    /// token, so tokens handed out earlier no longer affect this run.
    pub async fn retry(&mut self, source: &StreamSource) -> PlaybackState {
        self.attempts = 0;
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        self.run(source).await
    }

    fn playing(&mut self) -> PlaybackState {
        self.attempts = 0;
        self.publish(PlaybackState::Playing);
        PlaybackState::Playing
    }

    fn publish(&self, state: PlaybackState) {
        self.state.send_replace(state);
    }
}

/// Checks a source over HTTP: HLS manifests must parse, embeds must answer 2xx.
pub struct HttpStreamPlayer {
    client: Client,
    current: Option<StreamSource>,
}

impl HttpStreamPlayer {
    pub fn new(client: Client) -> Self {
        HttpStreamPlayer { client, current: None }
    }

    async fn fetch_source(&self, source: &StreamSource) -> Result<(), PlayerError> {
        let response = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| PlayerError::fatal(PlayerErrorKind::Network, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlayerError::fatal(
                PlayerErrorKind::Network,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        if !source.kind.is_hls() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|e| PlayerError::fatal(PlayerErrorKind::Network, e.to_string()))?;

        if body.trim_start().starts_with("#EXTM3U") {
            Ok(())
        } else {
            Err(PlayerError::fatal(PlayerErrorKind::Media, "manifestParsingError"))
        }
    }
}

#[async_trait]
impl StreamPlayer for HttpStreamPlayer {
    async fn start(&mut self, source: &StreamSource) -> Result<(), PlayerError> {
        self.current = Some(source.clone());
        self.fetch_source(source).await
    }

    async fn recover_media_error(&mut self) -> Result<(), PlayerError> {
        match self.current.clone() {
            Some(source) => self.fetch_source(&source).await,
            None => Err(PlayerError::fatal(PlayerErrorKind::Other, "no active source")),
        }
    }

    async fn destroy(&mut self) {
        self.current = None;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamCheck {
    pub source: StreamSource,
    #[serde(flatten)]
    pub state: PlaybackState,
    pub attempts: u32,
}

/// Supervises every source concurrently and reports where each one ended up.
/// A source still loading or retrying when `deadline` passes is reported as an error.
pub async fn check_streams(
    client: &Client,
    sources: Vec<StreamSource>,
    policy: RetryPolicy,
    deadline: Duration,
) -> Vec<StreamCheck> {
    let checks = sources.into_iter().map(|source| {
        let player = HttpStreamPlayer::new(client.clone());
        check_source(player, source, policy, deadline)
    });

    join_all(checks).await
}

async fn check_source<P: StreamPlayer>(
    player: P,
    source: StreamSource,
    policy: RetryPolicy,
    deadline: Duration,
) -> StreamCheck {
    let mut supervisor = PlaybackSupervisor::new(player, policy);

    let outcome = tokio::time::timeout(deadline, supervisor.run(&source)).await;
    let state = match outcome {
        Ok(state) => state,
        Err(_) => {
            tracing::warn!("⏱️ Stream check for {} gave up after {:?}", source.url, deadline);
            supervisor.player.destroy().await;
            let timed_out = PlaybackState::Error { message: CHECK_TIMEOUT_ERROR.to_string() };
            supervisor.publish(timed_out.clone());
            timed_out
        }
    };
    let attempts = supervisor.total_retries();

    StreamCheck { source, state, attempts }
}
