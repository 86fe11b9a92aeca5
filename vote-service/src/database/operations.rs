use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use super::models::*;
use super::sql::{
    COUNT_VOTES_SQL, INSERT_VOTE_SQL, SELECT_ALL_VOTES_SQL, SELECT_VOTES_PAGE_SQL,
    SELECT_VOTE_BY_VOTER_SQL,
};

/// Database operations for the votes table
impl VoteRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            voter_id: row.try_get("voter_id")?,
            choice_id: row.try_get("choice_id")?,
            cast_at_micros: row.try_get("cast_at_micros")?,
        })
    }

    /// Insert the vote and return its row id. Fails with a unique violation
    /// if the voter already has a row.
    pub async fn insert(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        debug!(
            "Inserting vote of {} for {}",
            self.voter_id, self.choice_id
        );

        let result = sqlx::query(INSERT_VOTE_SQL)
            .bind(&self.voter_id)
            .bind(&self.choice_id)
            .bind(self.cast_at_micros)
            .execute(pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// All votes in ledger order
    pub async fn get_all(pool: &SqlitePool) -> Result<Vec<VoteRecord>, sqlx::Error> {
        let rows = sqlx::query(SELECT_ALL_VOTES_SQL).fetch_all(pool).await?;
        rows.iter().map(Self::from_row).collect()
    }

    /// A window of the ledger, in ledger order
    pub async fn get_page(
        pool: &SqlitePool,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<VoteRecord>, sqlx::Error> {
        let rows = sqlx::query(SELECT_VOTES_PAGE_SQL)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        rows.iter().map(Self::from_row).collect()
    }

    pub async fn get_by_voter(
        pool: &SqlitePool,
        voter_id: &str,
    ) -> Result<Option<VoteRecord>, sqlx::Error> {
        let row = sqlx::query(SELECT_VOTE_BY_VOTER_SQL)
            .bind(voter_id)
            .fetch_optional(pool)
            .await?;
        row.as_ref().map(Self::from_row).transpose()
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(COUNT_VOTES_SQL).fetch_one(pool).await
    }
}

impl MigrationRecord {
    pub async fn get_all(pool: &SqlitePool) -> Result<Vec<MigrationRecord>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT version, applied_at, description FROM schema_migrations ORDER BY version",
        )
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(MigrationRecord {
                    version: row.try_get("version")?,
                    applied_at: row.try_get("applied_at")?,
                    description: row.try_get("description")?,
                })
            })
            .collect()
    }
}
