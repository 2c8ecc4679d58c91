//! Language model classifier
//!
//! Prompts a chat model with the taxonomy and few-shot examples, validates the
//! JSON it returns, and retries a bounded number of times. Every attempt ends
//! in exactly one of: accepted, invalid response, failed call, or timeout.
//! Failed calls and timeouts consume an attempt just like invalid responses.

pub mod client;
pub mod prompt;
pub mod validation;

pub use client::OpenAiCompatClient;
pub use validation::{validate_response, ValidatedResponse, ValidationError, REQUIRED_KEYS};

use async_trait::async_trait;
use poclass_core::{ChatMessage, Classification, Result, Taxonomy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A chat-completion backend
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Return the text content of the model's reply
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;

    /// Model identifier
    fn model(&self) -> &str;
}

/// Sampling temperature used for every call
pub const TEMPERATURE: f32 = 0.0;

/// Retry settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Total attempts, including the first; zero is raised to one
    pub max_attempts: u32,

    /// Bound on each individual call
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttemptFailure {
    #[error("invalid response: {0}")]
    Invalid(#[from] ValidationError),

    #[error("call failed: {0}")]
    CallFailed(String),

    #[error("call timed out")]
    TimedOut,
}

impl AttemptFailure {
    fn label(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid",
            Self::CallFailed(_) => "call_failed",
            Self::TimedOut => "timeout",
        }
    }
}

/// Result of the whole retry loop
#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutcome {
    /// A response passed validation
    Accepted(Classification),

    /// Every attempt failed
    Exhausted(Vec<AttemptFailure>),
}

/// Validating, retrying language model classifier
pub struct LlmClassifier {
    client: Arc<dyn LlmClient>,
    taxonomy: Arc<Taxonomy>,
    config: LlmConfig,
    system_prompt: String,
}

impl LlmClassifier {
    /// Create a classifier; the system prompt is rendered once from the taxonomy
    pub fn new(client: Arc<dyn LlmClient>, taxonomy: Arc<Taxonomy>, mut config: LlmConfig) -> Self {
        config.max_attempts = config.max_attempts.max(1);
        let system_prompt = prompt::system_prompt(&taxonomy);
        Self {
            client,
            taxonomy,
            config,
            system_prompt,
        }
    }

    /// Classify a description, retrying up to `max_attempts` times
    pub async fn classify(&self, description: &str, supplier: &str) -> LlmOutcome {
        let messages = [
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(prompt::user_prompt(description, supplier)),
        ];

        let mut failures = Vec::new();
        for attempt in 1..=self.config.max_attempts {
            match self.attempt(&messages, description).await {
                Ok(classification) => {
                    metrics::counter!("poclass_llm_attempts_total", "outcome" => "accepted")
                        .increment(1);
                    debug!(attempt, model = self.client.model(), "LLM response accepted");
                    return LlmOutcome::Accepted(classification);
                }
                Err(failure) => {
                    metrics::counter!("poclass_llm_attempts_total", "outcome" => failure.label())
                        .increment(1);
                    warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        "LLM attempt failed: {}",
                        failure
                    );
                    failures.push(failure);
                }
            }
        }

        LlmOutcome::Exhausted(failures)
    }

    async fn attempt(
        &self,
        messages: &[ChatMessage],
        description: &str,
    ) -> std::result::Result<Classification, AttemptFailure> {
        let call = self.client.complete(messages, TEMPERATURE);
        let raw = match tokio::time::timeout(self.config.timeout, call).await {
            Err(_) => return Err(AttemptFailure::TimedOut),
            Ok(Err(poclass_core::Error::Timeout)) => return Err(AttemptFailure::TimedOut),
            Ok(Err(e)) => return Err(AttemptFailure::CallFailed(e.to_string())),
            Ok(Ok(raw)) => raw,
        };

        let response = validate_response(&raw, &self.taxonomy)?;
        Ok(Classification::new(
            description,
            response.triple,
            response.confidence,
            response.reason,
        ))
    }
}
