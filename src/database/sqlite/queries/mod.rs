#[cfg(test)]
mod tests;

use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

pub struct SessionQueries;

impl SessionQueries {
    /// Insert the session if it is new, otherwise bump `last_active`.
    #[inline]
    pub async fn touch(pool: &SqlitePool, session_id: &str) -> Result<Session> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO sessions (id, created_date, last_active) VALUES (?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET last_active = excluded.last_active",
        )
        .bind(session_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to upsert session")?;

        Self::get_by_id(pool, session_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve upserted session"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, session_id: &str) -> Result<Option<Session>> {
        let result = sqlx::query_as::<_, Session>(
            "SELECT id, created_date, last_active FROM sessions WHERE id = ?",
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get session by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(pool)
            .await
            .context("Failed to count sessions")?;

        Ok(count.0)
    }
}

pub struct QueryRecordQueries;

impl QueryRecordQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_record: NewQueryRecord) -> Result<QueryRecord> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO query_records
                 (session_id, request_text, generated_template, compliance_score, created_date)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_record.session_id)
        .bind(&new_record.request_text)
        .bind(&new_record.generated_template)
        .bind(new_record.compliance_score)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create query record")?
        .last_insert_rowid();

        debug!("Recorded query {} for session {}", id, new_record.session_id);

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created query record"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<QueryRecord>> {
        let result = sqlx::query_as::<_, QueryRecord>(
            "SELECT id, session_id, request_text, generated_template, compliance_score, created_date
             FROM query_records WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get query record by id")?;

        Ok(result)
    }

    /// Most recent records first.
    #[inline]
    pub async fn get_by_session(
        pool: &SqlitePool,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<QueryRecord>> {
        let records = sqlx::query_as::<_, QueryRecord>(
            "SELECT id, session_id, request_text, generated_template, compliance_score, created_date
             FROM query_records
             WHERE session_id = ?
             ORDER BY created_date DESC, id DESC
             LIMIT ?",
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to get query records for session")?;

        Ok(records)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM query_records")
            .fetch_one(pool)
            .await
            .context("Failed to count query records")?;

        Ok(count.0)
    }
}

pub struct TokenUsageQueries;

impl TokenUsageQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_usage: NewTokenUsage) -> Result<TokenUsage> {
        let now = Utc::now().naive_utc();
        let total_tokens = new_usage.total_tokens();
        let id = sqlx::query(
            "INSERT INTO token_usage
                 (session_id, model_name, request_type, prompt_tokens, completion_tokens,
                  total_tokens, total_cost, processing_time_ms, created_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_usage.session_id)
        .bind(&new_usage.model_name)
        .bind(&new_usage.request_type)
        .bind(new_usage.prompt_tokens)
        .bind(new_usage.completion_tokens)
        .bind(total_tokens)
        .bind(new_usage.total_cost)
        .bind(new_usage.processing_time_ms)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to record token usage")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created usage row"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<TokenUsage>> {
        let result = sqlx::query_as::<_, TokenUsage>(
            "SELECT id, session_id, model_name, request_type, prompt_tokens, completion_tokens,
                    total_tokens, total_cost, processing_time_ms, created_date
             FROM token_usage WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get usage row by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn summarize_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Option<UsageSummary>> {
        let summary = sqlx::query_as::<_, UsageSummary>(
            "SELECT session_id,
                    COUNT(*) AS request_count,
                    COALESCE(SUM(prompt_tokens), 0) AS total_prompt_tokens,
                    COALESCE(SUM(completion_tokens), 0) AS total_completion_tokens,
                    COALESCE(SUM(total_tokens), 0) AS total_tokens,
                    COALESCE(SUM(total_cost), 0.0) AS total_cost
             FROM token_usage
             WHERE session_id = ?
             GROUP BY session_id",
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await
        .context("Failed to summarize session usage")?;

        Ok(summary)
    }

    #[inline]
    pub async fn total_cost(pool: &SqlitePool) -> Result<f64> {
        let total: (f64,) = sqlx::query_as("SELECT COALESCE(SUM(total_cost), 0.0) FROM token_usage")
            .fetch_one(pool)
            .await
            .context("Failed to total usage cost")?;

        Ok(total.0)
    }
}
