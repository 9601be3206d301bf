use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{
    NewQueryRecord, NewTokenUsage, QueryRecord, Session, TokenUsage, UsageSummary,
};
use crate::database::sqlite::queries::{QueryRecordQueries, SessionQueries, TokenUsageQueries};

#[cfg(test)]
mod tests;

pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

/// SQLite metadata store for sessions, generation history, and usage
/// accounting. Embedding vectors live in LanceDB, never here.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("metadata.db");
        let db_url = db_path.to_string_lossy();

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(db_url.as_ref()).await
    }

    // Session operations
    pub async fn touch_session(&self, session_id: &str) -> Result<Session> {
        SessionQueries::touch(&self.pool, session_id).await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        SessionQueries::get_by_id(&self.pool, session_id).await
    }

    pub async fn count_sessions(&self) -> Result<i64> {
        SessionQueries::count(&self.pool).await
    }

    // Query record operations
    pub async fn record_query(&self, new_record: NewQueryRecord) -> Result<QueryRecord> {
        QueryRecordQueries::create(&self.pool, new_record).await
    }

    pub async fn get_session_queries(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<QueryRecord>> {
        QueryRecordQueries::get_by_session(&self.pool, session_id, limit).await
    }

    pub async fn count_queries(&self) -> Result<i64> {
        QueryRecordQueries::count(&self.pool).await
    }

    // Token usage operations
    pub async fn record_usage(&self, new_usage: NewTokenUsage) -> Result<TokenUsage> {
        TokenUsageQueries::create(&self.pool, new_usage).await
    }

    pub async fn session_usage_summary(
        &self,
        session_id: &str,
    ) -> Result<Option<UsageSummary>> {
        TokenUsageQueries::summarize_session(&self.pool, session_id).await
    }

    pub async fn total_usage_cost(&self) -> Result<f64> {
        TokenUsageQueries::total_cost(&self.pool).await
    }
}
