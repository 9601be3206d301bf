//! External text-generation boundary.
//!
//! The orchestrator treats completion as a black box behind
//! [`CompletionClient`]; retry and backoff live here, never in the
//! orchestrator, so the generation path stays deterministic and testable.

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
const DEFAULT_RETRY_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    #[inline]
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

/// One completed generation with the token counts the usage tracker needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Completion {
    #[inline]
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// External completion function: prompt in, generated text out.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
}

/// Ollama `/api/generate` client.
#[derive(Debug, Clone)]
pub struct OllamaCompletionClient {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
    retry_attempts: u32,
}

impl OllamaCompletionClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.ollama.completion_model.clone(),
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn call_generate(&self, request_json: &str, url: &Url) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!(
                "Completion request attempt {}/{}",
                attempt, self.retry_attempts
            );

            match self
                .agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
            {
                Ok(response_text) => return Ok(response_text),
                Err(error) => {
                    let retryable = matches!(
                        &error,
                        ureq::Error::ConnectionFailed
                            | ureq::Error::HostNotFound
                            | ureq::Error::Timeout(_)
                            | ureq::Error::Io(_)
                    ) || matches!(&error, ureq::Error::StatusCode(status) if *status >= 500);

                    if !retryable {
                        return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                    }

                    warn!(
                        "Completion request failed (attempt {}/{}): {}",
                        attempt, self.retry_attempts, error
                    );
                    last_error = Some(anyhow::anyhow!("Request error: {}", error));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }
}

impl CompletionClient for OllamaCompletionClient {
    #[inline]
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion> {
        let url = self
            .base_url
            .join("/api/generate")
            .context("Failed to build generate URL")?;

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generate request")?;

        let response_text = self
            .call_generate(&request_json, &url)
            .context("Failed to call completion model")?;

        let response: GenerateResponse =
            serde_json::from_str(&response_text).context("Failed to parse generate response")?;

        debug!(
            "Completion produced {} chars ({:?} prompt / {:?} completion tokens)",
            response.response.chars().count(),
            response.prompt_eval_count,
            response.eval_count
        );

        Ok(Completion {
            text: response.response.trim().to_string(),
            model: self.model.clone(),
            prompt_tokens: response.prompt_eval_count.unwrap_or(0),
            completion_tokens: response.eval_count.unwrap_or(0),
        })
    }
}
