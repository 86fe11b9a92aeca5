//! Service configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use ballot::RetryPolicy;

use crate::database::constants::{DEFAULT_DB_PATH, DEFAULT_MAX_CONNECTIONS};
use crate::database::DbLocation;
use crate::utils::{env_opt, env_parse};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ELECTION_PATH: &str = "election.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_location: DbLocation,
    pub db_max_connections: u32,
    pub election_path: PathBuf,
    /// `None` disables the admin endpoints
    pub metrics_token: Option<String>,
    pub retry: RetryPolicy,
    pub cors_allow_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = env_opt("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let db_location = DbLocation::parse(&db_path)?;

        let db_max_connections = if db_location.is_memory() {
            1
        } else {
            env_parse("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS).max(1)
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: env_parse("APPEND_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            backoff: Duration::from_millis(env_parse(
                "APPEND_RETRY_BACKOFF_MS",
                defaults.backoff.as_millis() as u64,
            )),
        };

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            db_location,
            db_max_connections,
            election_path: env_opt("ELECTION_PATH")
                .unwrap_or_else(|| DEFAULT_ELECTION_PATH.to_string())
                .into(),
            metrics_token: env_opt("METRICS_AUTH_TOKEN"),
            retry,
            cors_allow_origin: env_opt("CORS_ALLOW_ORIGIN"),
        })
    }
}
