#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One client session. Sessions are identified by caller-supplied opaque
/// ids (UUIDs in practice) and track when they were last used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub created_date: NaiveDateTime,
    pub last_active: NaiveDateTime,
}

/// One generation request and its outcome, persisted for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QueryRecord {
    pub id: i64,
    pub session_id: String,
    pub request_text: String,
    pub generated_template: Option<String>,
    pub compliance_score: Option<f64>,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQueryRecord {
    pub session_id: String,
    pub request_text: String,
    pub generated_template: Option<String>,
    pub compliance_score: Option<f64>,
}

/// Per-call token accounting row. `request_type` distinguishes generation
/// from optimization calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TokenUsage {
    pub id: i64,
    pub session_id: String,
    pub model_name: String,
    pub request_type: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub total_cost: f64,
    pub processing_time_ms: i64,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTokenUsage {
    pub session_id: String,
    pub model_name: String,
    pub request_type: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_cost: f64,
    pub processing_time_ms: i64,
}

impl NewTokenUsage {
    #[inline]
    pub fn total_tokens(&self) -> i64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Aggregated usage for one session, produced by a GROUP BY over
/// `token_usage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UsageSummary {
    pub session_id: String,
    pub request_count: i64,
    pub total_prompt_tokens: i64,
    pub total_completion_tokens: i64,
    pub total_tokens: i64,
    pub total_cost: f64,
}
