#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use livestream_api::config::AppConfig;
use livestream_api::state::AppState;
use livestream_api::{build_router, serve};

pub struct TestApp {
    pub address: String,
    pub feed_address: String,
    pub votes_file: PathBuf,
    pub client: Client,
}

impl TestApp {
    pub async fn vote_as(&self, match_id: &str, ip: &str, choice: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/api/polls/{}/vote", self.address, match_id))
            .header("x-forwarded-for", ip)
            .json(&json!({ "teamChoice": choice }))
            .send()
            .await
            .expect("Failed to send vote")
    }

    pub async fn results(&self, match_id: &str) -> Value {
        self.client
            .get(format!("{}/api/polls/{}/results", self.address, match_id))
            .send()
            .await
            .expect("Failed to fetch results")
            .json()
            .await
            .expect("Results were not JSON")
    }

    pub async fn user_vote(&self, match_id: &str, ip: &str) -> Value {
        self.client
            .get(format!("{}/api/polls/{}/user-vote", self.address, match_id))
            .header("x-forwarded-for", ip)
            .send()
            .await
            .expect("Failed to fetch user vote")
            .json()
            .await
            .expect("User vote was not JSON")
    }

    pub fn cleanup(&self) {
        if let Some(dir) = self.votes_file.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

pub fn scratch_votes_file() -> PathBuf {
    std::env::temp_dir()
        .join(format!("livestream-api-test-{}", Uuid::new_v4()))
        .join("votes.json")
}

/// Feed with one live match whose streams point back at the fake feed server.
fn feed_payload(feed_address: &str) -> Value {
    json!([
        {
            "id": "live-1",
            "clubs": {
                "home": { "name": "Arsenal", "logo": "https://img.example/ars.png" },
                "away": { "name": "Chelsea", "logo": "https://img.example/che.png" }
            },
            "streams": {
                "src1": format!("{}/embed", feed_address),
                "src2": "",
                "hls1": format!("{}/live.m3u8", feed_address),
                "hls2": format!("{}/broken.m3u8", feed_address),
                "mhls1": "",
                "mhls2": ""
            },
            "score": { "home": 1, "away": 1, "status": "LIVE" },
            "competition": { "id": "PL", "name": "Premier League", "matchday": 12 },
            "kickoff": { "date": "2025-03-01", "time": "17:30", "timezone": "UTC" },
            "venue": { "name": "Emirates Stadium", "city": "London", "country": "England" }
        },
        {
            "id": "done-1",
            "clubs": {
                "home": { "name": "Real Madrid", "logo": "" },
                "away": { "name": "Barcelona", "logo": "" }
            },
            "score": { "home": 2, "away": 3, "status": "FT" },
            "competition": { "id": "LL", "name": "LaLiga", "matchday": 20 },
            "kickoff": { "date": "2025-02-01", "time": "20:00", "timezone": "+01:00" }
        },
        {
            "id": "later-1",
            "clubs": {
                "home": { "name": "Inter", "logo": "" },
                "away": { "name": "Milan", "logo": "" }
            },
            "score": { "home": 0, "away": 0, "status": "" },
            "competition": { "id": "SA", "name": "Serie A", "matchday": 5 },
            "kickoff": { "date": "2099-09-01", "time": "18:45", "timezone": "UTC" }
        }
    ])
}

async fn spawn_feed() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind feed port");
    let address = format!("http://{}", listener.local_addr().unwrap());

    let payload = feed_payload(&address);
    let app = Router::new()
        .route(
            "/feed.json",
            get(move || {
                let payload = payload.clone();
                async move { Json(payload) }
            }),
        )
        .route("/live.m3u8", get(|| async { "#EXTM3U\n#EXT-X-VERSION:3\n" }))
        .route("/broken.m3u8", get(|| async { "<html>not a playlist</html>" }))
        .route("/embed", get(|| async { "<iframe></iframe>" }));

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Feed server failed");
    });

    address
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_votes(scratch_votes_file()).await
}

pub async fn spawn_app_with_votes(votes_file: PathBuf) -> TestApp {
    let feed_address = spawn_feed().await;

    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        votes_file: votes_file.clone(),
        matches_feed_url: format!("{}/feed.json", feed_address),
        matches_cache_ttl: Duration::from_secs(60),
        feed_timeout: Duration::from_secs(5),
        player_retry_base: Duration::from_millis(1),
        player_max_attempts: 2,
        stream_check_timeout: Duration::from_secs(30),
        trust_proxy_headers: true,
    };

    let state = AppState::new(config).await.expect("Failed to build state");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = format!("http://{}", listener.local_addr().unwrap());

    let _ = tokio::spawn(serve(listener, build_router(state)));

    TestApp {
        address,
        feed_address,
        votes_file,
        client: Client::new(),
    }
}
