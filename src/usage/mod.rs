//! Token accounting for completion calls.
//!
//! Costs are computed per thousand tokens against a configurable price
//! table and persisted to the metadata database per session.

#[cfg(test)]
mod tests;

use crate::database::sqlite::Database;
use crate::database::sqlite::models::{NewTokenUsage, TokenUsage, UsageSummary};
use crate::llm::Completion;
use anyhow::Result;
use tracing::debug;

/// Price per 1000 tokens, split by direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl Default for ModelPricing {
    #[inline]
    fn default() -> Self {
        Self {
            prompt_per_1k: 0.000_15,
            completion_per_1k: 0.000_6,
        }
    }
}

impl ModelPricing {
    #[inline]
    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        let prompt_cost = prompt_tokens as f64 / 1000.0 * self.prompt_per_1k;
        let completion_cost = completion_tokens as f64 / 1000.0 * self.completion_per_1k;
        prompt_cost + completion_cost
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Generation,
    Optimization,
}

impl RequestType {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Optimization => "optimization",
        }
    }
}

pub struct UsageTracker {
    database: Database,
    pricing: ModelPricing,
}

impl UsageTracker {
    #[inline]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            pricing: ModelPricing::default(),
        }
    }

    #[inline]
    pub fn with_pricing(mut self, pricing: ModelPricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Record one completion call against the session.
    pub async fn track(
        &self,
        session_id: &str,
        request_type: RequestType,
        completion: &Completion,
        processing_time_ms: u64,
    ) -> Result<TokenUsage> {
        let cost = self
            .pricing
            .cost(completion.prompt_tokens, completion.completion_tokens);

        debug!(
            "Tracking {} call for session '{}': {} tokens, ${:.6}",
            request_type.as_str(),
            session_id,
            completion.total_tokens(),
            cost
        );

        self.database.touch_session(session_id).await?;
        self.database
            .record_usage(NewTokenUsage {
                session_id: session_id.to_string(),
                model_name: completion.model.clone(),
                request_type: request_type.as_str().to_string(),
                prompt_tokens: completion.prompt_tokens as i64,
                completion_tokens: completion.completion_tokens as i64,
                total_cost: cost,
                processing_time_ms: processing_time_ms as i64,
            })
            .await
    }

    pub async fn session_summary(&self, session_id: &str) -> Result<Option<UsageSummary>> {
        self.database.session_usage_summary(session_id).await
    }

    pub async fn total_cost(&self) -> Result<f64> {
        self.database.total_usage_cost().await
    }
}
