//! Inference client abstraction.
//!
//! The engine talks to the local inference server through the
//! [`InferenceClient`] trait; [`OllamaClient`] is the shipped implementation.

mod ollama;

pub use ollama::OllamaClient;

use crate::Result;
use std::time::Duration;

/// A fully assembled generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Model name.
    pub model: String,
    /// System instruction text.
    pub system: String,
    /// The prepared document text.
    pub prompt: String,
    /// Context-window size override.
    pub num_ctx: Option<u32>,
    /// Continuation tokens from a prior generation, for continuous prompts.
    pub context: Option<Vec<i64>>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Nucleus sampling override.
    pub top_p: Option<f32>,
    /// Repeat-penalty override.
    pub repeat_penalty: Option<f32>,
    /// How long the server should keep the model loaded.
    pub keep_alive: Option<String>,
}

/// The result of a successful generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOutcome {
    /// Generated response text.
    pub response: String,
    /// Continuation tokens for a follow-up generation, when supplied.
    pub context: Option<Vec<i64>>,
}

/// Trait for inference backends.
pub trait InferenceClient {
    /// The backend name.
    fn name(&self) -> &'static str;

    /// The endpoint this client talks to.
    fn endpoint(&self) -> &str;

    /// Cheap connectivity probe, run before any text is sent.
    fn check_connection(&self) -> bool;

    /// Generates a completion for the prepared request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the payload cannot be parsed.
    fn generate(&self, request: &GenerateRequest) -> Result<GenerateOutcome>;
}

/// HTTP client configuration for inference requests.
#[derive(Debug, Clone, Copy)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmHttpConfig {
    /// Loads HTTP configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("MARGINALIA_LLM_TIMEOUT_MS") {
            if let Ok(timeout_ms) = v.parse::<u64>() {
                self.timeout_ms = timeout_ms;
            }
        }
        if let Ok(v) = std::env::var("MARGINALIA_LLM_CONNECT_TIMEOUT_MS") {
            if let Ok(connect_timeout_ms) = v.parse::<u64>() {
                self.connect_timeout_ms = connect_timeout_ms;
            }
        }
        self
    }
}

/// Builds a blocking HTTP client for inference requests with configured
/// timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build inference HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}
