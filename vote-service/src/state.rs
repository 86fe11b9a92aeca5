//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};
use ballot::VoteSubmissionService;
use cli::{BuildInfo, ElectionRoll, MetaResponse};
use tracing::info;

use crate::config::Config;
use crate::database::{Database, DbLocation};

pub type VoteService = VoteSubmissionService<Database>;

/// Static description of the election being served
#[derive(Debug, Clone)]
pub struct ElectionInfo {
    pub roll: ElectionRoll,
    pub build: BuildInfo,
}

impl ElectionInfo {
    pub fn meta(&self) -> MetaResponse {
        MetaResponse {
            name: self.roll.name.clone(),
            opens_at: self.roll.opens_at,
            closes_at: self.roll.closes_at,
            choices: self.roll.choices.len(),
            voters: self.roll.voters.len(),
            build: self.build.clone(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VoteService>,
    pub election: Arc<ElectionInfo>,
    pub db_location: DbLocation,
    pub metrics_token: Option<Arc<str>>,
}

impl AppState {
    /// Open the ledger, build the submission service for `roll` and replay
    /// existing votes into it.
    pub async fn initialize(config: &Config, roll: ElectionRoll) -> Result<Self> {
        let db = Database::connect(&config.db_location, config.db_max_connections).await?;

        let service = roll
            .build_service(db)?
            .with_retry_policy(config.retry);
        let restored = service
            .restore()
            .await
            .context("Ledger does not match the election roll")?;
        info!(
            "Serving election '{}' with {} choices, {} voters, {} votes cast",
            roll.name,
            roll.choices.len(),
            roll.voters.len(),
            restored
        );

        Ok(Self {
            service: Arc::new(service),
            election: Arc::new(ElectionInfo {
                roll,
                build: build_info(),
            }),
            db_location: config.db_location.clone(),
            metrics_token: config.metrics_token.as_deref().map(Arc::from),
        })
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("VOTE_SERVICE_BUILD_GIT_HASH").map(str::to_string),
        build_time_unix: option_env!("VOTE_SERVICE_BUILD_TIME_UNIX").map(str::to_string),
    }
}
