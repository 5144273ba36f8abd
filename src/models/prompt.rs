//! Resolved prompt model.

use regex::Regex;

/// Built-in fallback instruction used when no other tier resolves.
pub const DEFAULT_INSTRUCTION: &str = "You are a thoughtful writing companion. \
Read the journal entry below and reply with a short, concrete reflection that \
helps the author continue their train of thought.";

/// The immutable result of prompt resolution for one generation request.
///
/// Produced fresh per request by the resolver and never mutated afterwards.
/// The instruction `text` is always non-empty; every other field is an
/// optional override layered on top of the global settings.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPrompt {
    /// System instruction text sent to the model. Never empty.
    pub text: String,
    /// Model name override for this prompt.
    pub model: Option<String>,
    /// Context-window size override (`num_ctx`).
    pub num_ctx: Option<u32>,
    /// Whether this prompt keeps conversation state across invocations.
    pub is_continuous: bool,
    /// Whether plain wiki-links (not just embeds) are expanded.
    pub include_links: bool,
    /// Exclusion patterns scoped to this prompt, unioned with the global set.
    pub exclude_patterns: Vec<Regex>,
    /// Path of the prompt file this prompt came from, when it came from one.
    ///
    /// Used as the stable continuation key for continuous prompts.
    pub source_path: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Nucleus sampling (top-p) override.
    pub top_p: Option<f32>,
    /// Repeat-penalty override.
    pub repeat_penalty: Option<f32>,
}

impl ResolvedPrompt {
    /// Creates a resolved prompt carrying only instruction text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// The built-in default prompt, used when every other tier misses.
    #[must_use]
    pub fn built_in_default() -> Self {
        Self::from_text(DEFAULT_INSTRUCTION)
    }

    /// The continuation-store key component for this prompt.
    ///
    /// Prefers the prompt-file path when the prompt came from one, so that
    /// two slots sharing a file also share conversation state; falls back to
    /// the logical prompt key.
    #[must_use]
    pub fn source_or<'a>(&'a self, prompt_key: &'a str) -> &'a str {
        self.source_path.as_deref().unwrap_or(prompt_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text() {
        let prompt = ResolvedPrompt::from_text("Summarize.");
        assert_eq!(prompt.text, "Summarize.");
        assert!(prompt.model.is_none());
        assert!(!prompt.is_continuous);
        assert!(prompt.exclude_patterns.is_empty());
    }

    #[test]
    fn test_built_in_default_is_non_empty() {
        assert!(!ResolvedPrompt::built_in_default().text.trim().is_empty());
    }

    #[test]
    fn test_source_or_prefers_file_path() {
        let mut prompt = ResolvedPrompt::from_text("x");
        assert_eq!(prompt.source_or("reflection"), "reflection");

        prompt.source_path = Some("prompts/reflect.md".to_string());
        assert_eq!(prompt.source_or("reflection"), "prompts/reflect.md");
    }
}
