//! Typed HTTP client for the vote service.

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use ballot::{Choice, ChoiceId, Tally, Vote, VoteReceipt, VoterId};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::api::{ErrorBody, MetaResponse, SubmitVoteRequest, SummaryResponse, VoterStatusResponse};

pub const METRICS_TOKEN_HEADER: &str = "x-metrics-token";

/// Result of a vote submission the service answered.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted(VoteReceipt),
    Rejected { status: StatusCode, body: ErrorBody },
}

#[derive(Clone)]
pub struct VoteClient {
    http: Client,
    base_url: Url,
}

impl VoteClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_nodelay(true)
            .timeout(Duration::from_secs(15))
            .build()?;
        Self::with_http_client(http, base_url)
    }

    /// Reuse an existing connection pool, e.g. across load-test workers.
    pub fn with_http_client(http: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            bail!("Invalid base url: {}", base_url);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid base url: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let resp = self.http.get(self.url(segments)?).send().await?;
        decode(resp).await
    }

    pub async fn health(&self) -> Result<bool> {
        let resp = self.http.get(self.url(&["healthz"])?).send().await?;
        Ok(resp.status().is_success())
    }

    pub async fn submit_vote(&self, voter: &VoterId, choice: &ChoiceId) -> Result<SubmitOutcome> {
        let body = SubmitVoteRequest {
            voter_id: voter.clone(),
            choice_id: choice.clone(),
        };
        let resp = self
            .http
            .post(self.url(&["votes"])?)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(SubmitOutcome::Accepted(resp.json().await?));
        }
        let body = error_body(resp).await;
        Ok(SubmitOutcome::Rejected { status, body })
    }

    pub async fn tally(&self) -> Result<Tally> {
        self.get_json(&["votes", "tally"]).await
    }

    pub async fn summary(&self) -> Result<SummaryResponse> {
        self.get_json(&["votes", "summary"]).await
    }

    pub async fn votes(&self) -> Result<Vec<Vote>> {
        self.get_json(&["votes"]).await
    }

    pub async fn choices(&self) -> Result<Vec<Choice>> {
        self.get_json(&["choices"]).await
    }

    pub async fn meta(&self) -> Result<MetaResponse> {
        self.get_json(&["meta"]).await
    }

    pub async fn voter(&self, voter: &VoterId) -> Result<VoterStatusResponse> {
        self.get_json(&["voters", voter.as_str()]).await
    }

    /// `None` when the voter has not voted.
    pub async fn receipt(&self, voter: &VoterId) -> Result<Option<VoteReceipt>> {
        let resp = self
            .http
            .get(self.url(&["voters", voter.as_str(), "receipt"])?)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            let body = error_body(resp).await;
            if body.error == "NoVote" {
                return Ok(None);
            }
            bail!("{}: {}", body.error, body.message);
        }
        decode(resp).await.map(Some)
    }

    pub async fn audit(&self, token: &str) -> Result<serde_json::Value> {
        self.admin(&["admin", "audit"], token).await
    }

    pub async fn stats(&self, token: &str) -> Result<serde_json::Value> {
        self.admin(&["admin", "stats"], token).await
    }

    async fn admin(&self, segments: &[&str], token: &str) -> Result<serde_json::Value> {
        let resp = self
            .http
            .get(self.url(segments)?)
            .header(METRICS_TOKEN_HEADER, token)
            .send()
            .await?;
        decode(resp).await
    }
}

async fn error_body(resp: Response) -> ErrorBody {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(body) => body,
        Err(_) => ErrorBody {
            error: status
                .canonical_reason()
                .unwrap_or("UnknownError")
                .to_string(),
            message: String::new(),
        },
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = error_body(resp).await;
        bail!("Request failed with {}: {} {}", status, body.error, body.message);
    }
    Ok(resp.json().await?)
}
