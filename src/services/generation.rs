//! Generation orchestration.
//!
//! Composes prompt resolution, link expansion, callout filtering, and the
//! conversation context store, then hands the prepared request to the
//! inference client. Every failure surfaces a user-visible message and an
//! absent result; nothing in this path panics or propagates an error to the
//! host.

use crate::config::MarginaliaConfig;
use crate::context::ConversationContextStore;
use crate::llm::{GenerateRequest, InferenceClient};
use crate::observability::{LogNotifier, Notifier};
use crate::rendering::format_blockquote;
use crate::services::callout_filter::filter_callouts;
use crate::services::link_expander::LinkExpander;
use crate::services::prompt_resolver::{PromptResolver, global_patterns};
use crate::vault::Vault;
use crate::{Error, Result};
use regex::Regex;
use std::sync::Arc;

/// Orchestrates a single generation request end to end.
pub struct GenerationService<V: Vault, C: InferenceClient> {
    config: MarginaliaConfig,
    vault: V,
    client: C,
    notifier: Box<dyn Notifier>,
    store: Arc<ConversationContextStore>,
    global_patterns: Vec<Regex>,
}

impl<V: Vault, C: InferenceClient> GenerationService<V, C> {
    /// Creates a service with a log-backed notifier and a fresh context
    /// store.
    #[must_use]
    pub fn new(config: MarginaliaConfig, vault: V, client: C) -> Self {
        let global_patterns = global_patterns(&config);
        Self {
            config,
            vault,
            client,
            notifier: Box::new(LogNotifier::new()),
            store: Arc::new(ConversationContextStore::new()),
            global_patterns,
        }
    }

    /// Replaces the notification sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Shares an externally owned context store.
    #[must_use]
    pub fn with_context_store(mut self, store: Arc<ConversationContextStore>) -> Self {
        self.store = store;
        self
    }

    /// The persisted settings this service runs with.
    #[must_use]
    pub const fn config(&self) -> &MarginaliaConfig {
        &self.config
    }

    /// The conversation context store.
    #[must_use]
    pub fn context_store(&self) -> Arc<ConversationContextStore> {
        Arc::clone(&self.store)
    }

    /// Runs one generation for a note and prompt key.
    ///
    /// Returns the response text, or `None` after notifying the user about
    /// whatever went wrong.
    #[must_use]
    pub fn generate(&self, note_path: &str, editor_text: &str, prompt_key: &str) -> Option<String> {
        match self.try_generate(note_path, editor_text, prompt_key) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(note = note_path, prompt = prompt_key, error = %err, "Generation aborted");
                self.notifier.notify(&err.to_string());
                None
            }
        }
    }

    fn try_generate(&self, note_path: &str, editor_text: &str, prompt_key: &str) -> Result<String> {
        let slot = self
            .config
            .prompts
            .get(prompt_key)
            .ok_or_else(|| Error::InvalidInput(format!("unknown prompt '{prompt_key}'")))?;

        let resolver = PromptResolver::new(&self.vault, &self.config, self.notifier.as_ref());
        let resolved = resolver.resolve(note_path, prompt_key);

        let expander = LinkExpander::new(&self.vault, &self.global_patterns);
        let expanded = expander.expand(
            note_path,
            editor_text,
            resolved.include_links,
            &resolved.exclude_patterns,
        );

        let filtered = filter_callouts(&expanded, &slot.excluded_callout_types());
        if filtered.trim().is_empty() {
            return Err(Error::InvalidInput(
                "nothing to send: the document is empty after filtering".to_string(),
            ));
        }

        let model = resolved
            .model
            .clone()
            .or_else(|| self.config.model.clone())
            .ok_or_else(|| Error::Configuration("no model configured".to_string()))?;
        if self.config.endpoint.trim().is_empty() {
            return Err(Error::Configuration(
                "no inference endpoint configured".to_string(),
            ));
        }

        if !self.client.check_connection() {
            return Err(Error::Unreachable {
                endpoint: self.client.endpoint().to_string(),
            });
        }

        let context_key =
            ConversationContextStore::key(note_path, resolved.source_or(prompt_key));
        let prior_context = if resolved.is_continuous {
            self.store.get(&context_key)
        } else {
            None
        };

        let outcome = self.client.generate(&GenerateRequest {
            model,
            system: resolved.text.clone(),
            prompt: filtered,
            num_ctx: resolved.num_ctx,
            context: prior_context,
            temperature: resolved.temperature,
            top_p: resolved.top_p,
            repeat_penalty: resolved.repeat_penalty,
            keep_alive: self.config.keep_alive.clone(),
        })?;

        if resolved.is_continuous {
            self.store
                .put(&context_key, outcome.context.unwrap_or_default());
        }

        Ok(outcome.response)
    }

    /// Formats a response for insertion into the note, using the prompt
    /// slot's callout heading when one is configured.
    #[must_use]
    pub fn format_response(&self, text: &str, prompt_key: &str) -> String {
        let heading = self
            .config
            .prompts
            .get(prompt_key)
            .and_then(|slot| slot.callout_heading.as_deref());
        format_blockquote(text, heading)
    }
}
