//! Ollama (local) client.

use super::{GenerateOutcome, GenerateRequest, InferenceClient, LlmHttpConfig, build_http_client};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Ollama local inference client.
pub struct OllamaClient {
    /// API endpoint.
    endpoint: String,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "http://localhost:11434";

    /// Creates a new Ollama client.
    #[must_use]
    pub fn new() -> Self {
        let endpoint =
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| Self::DEFAULT_ENDPOINT.to_string());

        Self {
            endpoint,
            client: build_http_client(LlmHttpConfig::from_env()),
        }
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets HTTP client timeouts for inference requests.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    fn classify(err: &reqwest::Error) -> &'static str {
        if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connect"
        } else if err.is_request() {
            "request"
        } else {
            "unknown"
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceClient for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn check_connection(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.endpoint))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn generate(&self, request: &GenerateRequest) -> Result<GenerateOutcome> {
        let options = GenerateOptions {
            num_ctx: request.num_ctx,
            temperature: request.temperature,
            top_p: request.top_p,
            repeat_penalty: request.repeat_penalty,
        };
        let body = GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            system: &request.system,
            stream: false,
            context: request.context.as_deref(),
            keep_alive: request.keep_alive.as_deref(),
            options: if options.is_empty() {
                None
            } else {
                Some(options)
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&body)
            .send()
            .map_err(|e| {
                let error_kind = Self::classify(&e);
                tracing::error!(
                    provider = "ollama",
                    model = %request.model,
                    error = %e,
                    error_kind = error_kind,
                    is_timeout = e.is_timeout(),
                    is_connect = e.is_connect(),
                    "Inference request failed"
                );
                Error::OperationFailed {
                    operation: "ollama_generate".to_string(),
                    cause: format!("{error_kind} error: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                provider = "ollama",
                model = %request.model,
                status = %status,
                body = %body,
                "Inference API returned error status"
            );
            return Err(Error::OperationFailed {
                operation: "ollama_generate".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let payload: GenerateResponse = response.json().map_err(|e| {
            tracing::error!(
                provider = "ollama",
                model = %request.model,
                error = %e,
                "Failed to parse inference response"
            );
            Error::OperationFailed {
                operation: "ollama_response".to_string(),
                cause: e.to_string(),
            }
        })?;

        Ok(GenerateOutcome {
            response: payload.response,
            context: payload.context,
        })
    }
}

/// Request body for the Generate API.
#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a [i64]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

/// Model options forwarded to the server.
#[derive(Debug, Clone, Copy, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
}

impl GenerateOptions {
    const fn is_empty(&self) -> bool {
        self.num_ctx.is_none()
            && self.temperature.is_none()
            && self.top_p.is_none()
            && self.repeat_penalty.is_none()
    }
}

/// Response from the Generate API.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    context: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new().with_endpoint("http://localhost:12345");
        assert_eq!(client.name(), "ollama");
        assert_eq!(client.endpoint(), "http://localhost:12345");
    }

    #[test]
    fn test_options_is_empty() {
        let empty = GenerateOptions {
            num_ctx: None,
            temperature: None,
            top_p: None,
            repeat_penalty: None,
        };
        assert!(empty.is_empty());

        let with_ctx = GenerateOptions {
            num_ctx: Some(4096),
            ..empty
        };
        assert!(!with_ctx.is_empty());
    }

    #[test]
    fn test_generate_body_serialization_skips_absent_fields() {
        let body = GenerateBody {
            model: "llama3.2",
            prompt: "text",
            system: "system",
            stream: false,
            context: None,
            keep_alive: None,
            options: None,
        };
        let json = serde_json::to_string(&body).unwrap_or_default();
        assert!(json.contains("\"model\":\"llama3.2\""));
        assert!(!json.contains("context"));
        assert!(!json.contains("keep_alive"));
        assert!(!json.contains("options"));
    }

    #[test]
    fn test_generate_response_parses_context() {
        let payload = r#"{"response":"hi","context":[1,2,3]}"#;
        let parsed: GenerateResponse = serde_json::from_str(payload).unwrap_or_else(|_| {
            GenerateResponse {
                response: String::new(),
                context: None,
            }
        });
        assert_eq!(parsed.response, "hi");
        assert_eq!(parsed.context, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_generate_response_without_context() {
        let payload = r#"{"response":"hi"}"#;
        let parsed: GenerateResponse =
            serde_json::from_str(payload).unwrap_or_else(|_| GenerateResponse {
                response: String::new(),
                context: None,
            });
        assert_eq!(parsed.response, "hi");
        assert!(parsed.context.is_none());
    }
}
