//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the crate and
//! applied by [`run_migrations`], either when a [`Database`](crate::Database)
//! opens or through `atelier-admin migrate`.
//!
//! ```text
//!   migrations/sqlite/001_initial_schema.sql ──┐
//!   migrations/sqlite/NNN_next_change.sql   ──┤  sqlx::migrate!()
//!                                              ▼
//!                                         MIGRATOR ──► _sqlx_migrations
//!                                                      (version, checksum)
//! ```
//!
//! Applied files are checksummed by sqlx, so a file that has already shipped
//! is never edited. Schema changes go into a new `NNN_description.sql`.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date. Already-applied files are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying schema migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema is up to date");
    Ok(())
}

/// How many embedded migrations exist and how many the database has recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub total: usize,
    pub applied: usize,
}

impl MigrationStatus {
    /// Migrations embedded in this build but not yet recorded.
    pub fn pending(&self) -> usize {
        self.total.saturating_sub(self.applied)
    }
}

pub async fn status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if has_table {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    } else {
        0
    };

    Ok(MigrationStatus {
        total: MIGRATOR.migrations.len(),
        applied: applied as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn bare_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_status_before_and_after_run() {
        let pool = bare_pool().await;

        let before = status(&pool).await.unwrap();
        assert_eq!(before.applied, 0);
        assert_eq!(before.pending(), before.total);

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let after = status(&pool).await.unwrap();
        assert_eq!(after.applied, after.total);
        assert_eq!(after.pending(), 0);
    }
}
