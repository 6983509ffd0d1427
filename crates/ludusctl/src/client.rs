//! HTTP client for the ludusd API.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

use ludus_common::rpc::{
    CompleteGameRequest, CompleteGameResponse, ErrorBody, HealthResponse, LeaderboardEntry,
    LearnerUpsert, ProgressView, UnlockReplayResponse, WalletView,
};
use ludus_common::Learner;

pub struct LudusClient {
    base_url: String,
    http: reqwest::Client,
}

impl LudusClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turn a non-success response into a readable error.
    async fn check<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        if resp.status().is_success() {
            return Ok(resp.json().await?);
        }
        let status = resp.status();
        match resp.json::<ErrorBody>().await {
            Ok(body) => Err(anyhow!("{} ({status})", body.error)),
            Err(_) => Err(anyhow!("request failed with {status}")),
        }
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        Self::check(self.http.get(self.url("/v1/health")).send().await?).await
    }

    pub async fn progress(&self, learner: &str, game: &str) -> Result<ProgressView> {
        let path = format!("/v1/learners/{learner}/games/{game}/progress");
        Self::check(self.http.get(self.url(&path)).send().await?).await
    }

    pub async fn batch(
        &self,
        learner: &str,
        category: Option<&str>,
    ) -> Result<BTreeMap<String, ProgressView>> {
        let path = format!("/v1/learners/{learner}/progress");
        let mut req = self.http.get(self.url(&path));
        if let Some(category) = category {
            req = req.query(&[("category", category)]);
        }
        Self::check(req.send().await?).await
    }

    pub async fn wallet(&self, learner: &str) -> Result<WalletView> {
        let path = format!("/v1/learners/{learner}/wallet");
        Self::check(self.http.get(self.url(&path)).send().await?).await
    }

    pub async fn leaderboard(&self, period: &str) -> Result<Vec<LeaderboardEntry>> {
        let path = format!("/v1/leaderboard/{period}");
        Self::check(self.http.get(self.url(&path)).send().await?).await
    }

    pub async fn complete(
        &self,
        learner: &str,
        game: &str,
        req: &CompleteGameRequest,
    ) -> Result<CompleteGameResponse> {
        let path = format!("/v1/learners/{learner}/games/{game}/complete");
        Self::check(self.http.post(self.url(&path)).json(req).send().await?).await
    }

    pub async fn unlock_replay(&self, learner: &str, game: &str) -> Result<UnlockReplayResponse> {
        let path = format!("/v1/learners/{learner}/games/{game}/replay/unlock");
        Self::check(self.http.post(self.url(&path)).send().await?).await
    }

    pub async fn put_learner(&self, learner: &str, update: &LearnerUpsert) -> Result<Learner> {
        let path = format!("/v1/learners/{learner}");
        Self::check(self.http.put(self.url(&path)).json(update).send().await?).await
    }
}
