// Migration Runner

use clinicq_core::error::{AppError, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let current_version: i64 = if table_exists > 0 {
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .unwrap_or(0)
    } else {
        0
    };

    info!("Current schema version: {}", current_version);

    if current_version < 1 {
        info!("Applying migration 001: Initial schema");
        apply_migration(pool, include_str!("../migrations/001_initial_schema.sql")).await?;
    }

    info!("All migrations applied successfully");
    Ok(())
}

/// Apply a single migration SQL file inside one transaction
async fn apply_migration(pool: &SqlitePool, sql: &str) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    // Strip comment lines first: splitting on semicolons before that would
    // execute the tail of any comment containing one as SQL
    let stripped: String = sql
        .lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    for statement in stripped.split(';') {
        let clean_statement = statement.trim();
        if !clean_statement.is_empty() {
            sqlx::query(clean_statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
    }

    tx.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let result = run_migrations(&pool).await;

        if let Err(e) = &result {
            eprintln!("Migration error: {:?}", e);
        }
        assert!(result.is_ok());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_entries")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_comment_with_semicolon_is_not_executed_as_sql() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let sql = "\
            -- first half; second half must never reach the database\n\
            CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY);\n\
            -- trailing comment\n\
            INSERT INTO t (id) VALUES (1);";
        apply_migration(&pool, sql).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let version: i64 =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(version, 1);
    }
}
