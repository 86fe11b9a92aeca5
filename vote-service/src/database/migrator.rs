//! Database migration implementation (SQLx)

use anyhow::{bail, Result};
use sqlx::sqlite::SqlitePool;
use tracing::info;

use super::constants::{CURRENT_SCHEMA_VERSION, MIGRATION_DESCRIPTIONS};
use super::sql::{
    CREATE_APPEND_ONLY_TRIGGERS, CREATE_DB_INDEXES, CREATE_MIGRATIONS_TABLE_SQL,
    CREATE_VOTES_TABLE_SQL, INSERT_MIGRATION_SQL, SELECT_SCHEMA_VERSION_SQL,
};

/// Run all pending database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations");

    create_migrations_table(pool).await?;

    let current_version = get_current_version(pool).await?;
    info!("Current database version: {}", current_version);

    if current_version > CURRENT_SCHEMA_VERSION {
        bail!(
            "Database schema version {} is newer than supported version {}",
            current_version,
            CURRENT_SCHEMA_VERSION
        );
    }

    // Apply migrations in order
    if current_version < 1 {
        apply_migration_v1(pool).await?;
    }

    info!("All migrations completed");
    Ok(())
}

async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_MIGRATIONS_TABLE_SQL)
        .execute(pool)
        .await?;
    Ok(())
}

/// Get the current schema version, 0 for a fresh database
pub async fn get_current_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> = sqlx::query_scalar(SELECT_SCHEMA_VERSION_SQL)
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Apply migration version 1: votes table, ordering index and append-only triggers.
async fn apply_migration_v1(pool: &SqlitePool) -> Result<()> {
    info!("Applying migration v1: {}", MIGRATION_DESCRIPTIONS[0]);

    let mut tx = pool.begin().await?;

    sqlx::query(CREATE_VOTES_TABLE_SQL).execute(&mut *tx).await?;

    for index_sql in CREATE_DB_INDEXES {
        sqlx::query(index_sql).execute(&mut *tx).await?;
    }
    for trigger_sql in CREATE_APPEND_ONLY_TRIGGERS {
        sqlx::query(trigger_sql).execute(&mut *tx).await?;
    }

    sqlx::query(INSERT_MIGRATION_SQL)
        .bind(1)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(MIGRATION_DESCRIPTIONS[0])
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Migration v1 completed successfully");
    Ok(())
}
