//! # Marginalia
//!
//! An AI augmentation engine for markdown journal vaults.
//!
//! Marginalia takes a note from a vault, expands the wiki-links and embeds it
//! references into nested quoted blocks, strips previously generated AI
//! callouts, resolves the layered prompt configuration for the note, and hands
//! the result to a local inference server. The response comes back as a
//! formatted callout ready to splice into the note.
//!
//! ## Features
//!
//! - Layered prompt resolution (note frontmatter → prompt file → settings →
//!   built-in default) with per-prompt generation parameters
//! - Bounded, cycle-safe expansion of linked and embedded notes, including
//!   heading and block sub-references
//! - Depth-aware callout filtering so prior AI answers are never fed back to
//!   the model
//! - Time-expiring conversation context for continuous prompts
//!
//! ## Example
//!
//! ```rust,ignore
//! use marginalia::config::MarginaliaConfig;
//! use marginalia::llm::OllamaClient;
//! use marginalia::services::GenerationService;
//! use marginalia::vault::FsVault;
//!
//! let config = MarginaliaConfig::load_default();
//! let vault = FsVault::new("/path/to/vault");
//! let client = OllamaClient::new();
//! let service = GenerationService::new(config, vault, client);
//! if let Some(answer) = service.generate("journal/today.md", &text, "reflection") {
//!     println!("{}", service.format_response(&answer, "reflection"));
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod context;
pub mod llm;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod services;
pub mod vault;

// Re-exports for convenience
pub use config::{MarginaliaConfig, PromptSlot};
pub use context::ConversationContextStore;
pub use llm::{GenerateOutcome, GenerateRequest, InferenceClient, OllamaClient};
pub use models::{LinkRef, LinkTarget, ResolvedPrompt};
pub use observability::{LogNotifier, Notifier};
pub use services::{GenerationService, LinkExpander, PromptResolver, filter_callouts};
pub use vault::{FsVault, Vault};

/// Error type for marginalia operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Unknown prompt key, nothing left to send after filtering |
/// | `Configuration` | No model or endpoint configured for generation |
/// | `OperationFailed` | File reads fail, inference requests fail or return bad payloads |
/// | `Unreachable` | The inference server does not answer the connectivity probe |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - The requested prompt key has no configured slot
    /// - The document is empty after expansion and callout filtering
    /// - A config edit names a slot that does not exist
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The persisted configuration is incomplete for the requested operation.
    ///
    /// Raised when:
    /// - No model name is configured and the prompt supplies no override
    /// - The inference endpoint is blank
    /// - The protected built-in prompt slot would be removed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Vault file reads fail
    /// - The inference request errors or returns a non-success status
    /// - The inference response body cannot be parsed
    /// - The config file cannot be read or written
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The inference server could not be reached.
    ///
    /// Raised when the connectivity probe fails before any text is sent.
    #[error("inference server unreachable at {endpoint}")]
    Unreachable {
        /// The endpoint that was probed.
        endpoint: String,
    },
}

/// Result type alias for marginalia operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Centralized so the context store and its tests share one clock shape.
/// Uses `SystemTime::now()` with fallback to 0 if the system clock is before
/// the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
