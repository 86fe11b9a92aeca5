pub mod constants;
pub mod migrator;
pub mod models;
pub mod operations;
pub mod path;
pub mod sql;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use ballot::{ChoiceId, LedgerError, Vote, VoteLedger, VoteRecordId, VoterId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

pub use migrator::run_migrations;
pub use path::DbLocation;

use models::VoteRecord;

/// SQLite-backed vote ledger.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool and run migrations.
    ///
    /// An in-memory database lives as long as its connection, so the pool is
    /// pinned to a single connection that never expires.
    pub async fn connect(location: &DbLocation, max_connections: u32) -> Result<Self> {
        info!("Initializing database at {}", location);

        let pool = match location {
            DbLocation::Memory => {
                let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await?
            }
            DbLocation::File(path) => {
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(Duration::from_secs(5));
                SqlitePoolOptions::new()
                    .max_connections(max_connections.max(1))
                    .connect_with(options)
                    .await?
            }
        };

        run_migrations(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn vote_count(&self) -> Result<u64, LedgerError> {
        let count = VoteRecord::count(&self.pool).await.map_err(storage_error)?;
        Ok(count.max(0) as u64)
    }

    /// A window of the ledger, in ledger order
    pub async fn votes_page(&self, offset: u64, limit: u64) -> Result<Vec<Vote>, LedgerError> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        VoteRecord::get_page(&self.pool, offset, limit)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(Vote::try_from)
            .collect()
    }
}

fn storage_error(err: sqlx::Error) -> LedgerError {
    LedgerError::Storage(err.to_string())
}

impl VoteLedger for Database {
    async fn append(
        &self,
        voter: &VoterId,
        choice: &ChoiceId,
        timestamp: DateTime<Utc>,
    ) -> Result<VoteRecordId, LedgerError> {
        let record = VoteRecord::new(voter.as_str(), choice.as_str(), timestamp);
        match record.insert(&self.pool).await {
            Ok(id) => Ok(VoteRecordId(id as u64)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(LedgerError::DuplicateVoter(voter.clone()))
            }
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn all_votes(&self) -> Result<Vec<Vote>, LedgerError> {
        VoteRecord::get_all(&self.pool)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(Vote::try_from)
            .collect()
    }

    async fn vote_for(&self, voter: &VoterId) -> Result<Option<Vote>, LedgerError> {
        VoteRecord::get_by_voter(&self.pool, voter.as_str())
            .await
            .map_err(storage_error)?
            .map(Vote::try_from)
            .transpose()
    }
}
