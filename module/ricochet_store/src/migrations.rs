//! Database migration utilities.
//!
//! Provides unified migration application for both production and test
//! environments. Uses guard tables to prevent re-running migrations whose
//! `ALTER TABLE` statements would otherwise fail on a second run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ricochet_store::migrations::apply_all_migrations;
//!
//! let pool = SqlitePool::connect(database_url).await?;
//! apply_all_migrations(&pool).await?;
//! ```
//!
//! # Safety
//!
//! - Idempotent (safe to call multiple times)
//! - Guard tables prevent re-running `ALTER TABLE ... ADD COLUMN`, which
//!   `SQLite` rejects on a column that already exists
//! - Foreign keys are enabled before any migration runs

use crate::error::{Result, StoreError};
use sqlx::{query_scalar, SqlitePool};

/// Applies all migrations to the database pool, in order.
///
/// Safe to call multiple times (idempotent) — each crate that opens the store
/// (the CLI, the listener, tests) calls this once per pool it creates.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if any migration statement fails to execute.
pub async fn apply_all_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await
        .map_err(StoreError::Io)?;

    apply_migration_001(pool).await?;
    apply_migration_002(pool).await?;

    Ok(())
}

/// Migration 001: base schema — `injections` and `callbacks` tables and their
/// indexes.
async fn apply_migration_001(pool: &SqlitePool) -> Result<()> {
    let migration = include_str!("../migrations/001_initial_schema.sql");
    sqlx::raw_sql(migration)
        .execute(pool)
        .await
        .map_err(StoreError::Io)?;
    Ok(())
}

/// Migration 002 (GUARDED): adds the `callbacks.metadata_json` projection
/// column. Guarded because re-running `ALTER TABLE ADD COLUMN` on an already
/// migrated database is an error, not a no-op, in `SQLite`.
async fn apply_migration_002(pool: &SqlitePool) -> Result<()> {
    let completed: i64 = query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='_migration_002_completed'",
    )
    .fetch_one(pool)
    .await
    .map_err(StoreError::Io)?;

    if completed == 0 {
        let migration = include_str!("../migrations/002_add_callback_metadata.sql");
        sqlx::raw_sql(migration)
            .execute(pool)
            .await
            .map_err(StoreError::Io)?;
    }

    Ok(())
}
