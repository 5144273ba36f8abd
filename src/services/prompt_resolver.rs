//! Layered prompt resolution.
//!
//! A generation request needs instruction text and generation parameters.
//! Both come from a short-circuiting chain of lookup tiers, first hit wins:
//!
//! 1. note frontmatter `prompt` (inline instruction text),
//! 2. note frontmatter `prompt-file` (path to a prompt file),
//! 3. the prompt slot's configured prompt file,
//! 4. the built-in default instruction.
//!
//! The `prompt` and `prompt-file` fields accept either a plain value
//! (applies to every prompt key) or a mapping keyed by prompt key. Prompt
//! files carry generation parameters in their own frontmatter; parsing is
//! lenient, and any value failing its constraint is treated as absent.

use crate::config::MarginaliaConfig;
use crate::models::ResolvedPrompt;
use crate::observability::Notifier;
use crate::services::patterns::compile_patterns;
use crate::vault::{Frontmatter, Vault, split_frontmatter};
use regex::Regex;
use serde_yaml_ng::Value;

const TEMPERATURE_KEYS: &[&str] = &["temperature", "temp"];
const TOP_P_KEYS: &[&str] = &["top_p", "topP", "top-p"];
const REPEAT_PENALTY_KEYS: &[&str] = &["repeat_penalty", "repeatPenalty", "repeat-penalty"];
const CONTINUOUS_KEYS: &[&str] = &["isContinuous", "is_continuous", "is-continuous", "continuous"];
const INCLUDE_LINKS_KEYS: &[&str] = &["includeLinks", "include_links", "include-links"];
const EXCLUDE_PATTERN_KEYS: &[&str] = &["excludePatterns", "exclude_patterns", "exclude-patterns"];

/// Resolves the instruction text and parameters for a generation request.
pub struct PromptResolver<'a, V: Vault> {
    vault: &'a V,
    config: &'a MarginaliaConfig,
    notifier: &'a dyn Notifier,
}

impl<'a, V: Vault> PromptResolver<'a, V> {
    /// Creates a resolver over a vault and the persisted settings.
    #[must_use]
    pub const fn new(
        vault: &'a V,
        config: &'a MarginaliaConfig,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            vault,
            config,
            notifier,
        }
    }

    /// Resolves the prompt for a note and prompt key.
    ///
    /// Never fails: a tier that cannot produce a usable prompt falls through
    /// to the next, ending at the built-in default.
    #[must_use]
    pub fn resolve(&self, note_path: &str, prompt_key: &str) -> ResolvedPrompt {
        let note_fm = self.vault.frontmatter(note_path);

        self.from_inline_text(note_fm.as_ref(), prompt_key)
            .or_else(|| self.from_note_prompt_file(note_fm.as_ref(), prompt_key))
            .or_else(|| self.from_configured_prompt_file(prompt_key))
            .unwrap_or_else(ResolvedPrompt::built_in_default)
    }

    /// Tier 1: inline `prompt` field in the note's frontmatter.
    fn from_inline_text(&self, fm: Option<&Frontmatter>, prompt_key: &str) -> Option<ResolvedPrompt> {
        let value = fm?.get("prompt")?;
        let text = string_or_keyed(value, prompt_key)?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(ResolvedPrompt::from_text(text))
    }

    /// Tier 2: `prompt-file` field in the note's frontmatter.
    fn from_note_prompt_file(
        &self,
        fm: Option<&Frontmatter>,
        prompt_key: &str,
    ) -> Option<ResolvedPrompt> {
        let value = fm?.get("prompt-file")?;
        let path = string_or_keyed(value, prompt_key)?;
        self.read_prompt_file(path.trim())
    }

    /// Tier 3: the prompt slot's configured prompt file.
    fn from_configured_prompt_file(&self, prompt_key: &str) -> Option<ResolvedPrompt> {
        let slot = self.config.prompts.get(prompt_key)?;
        let path = slot.prompt_file.as_deref()?;
        self.read_prompt_file(path.trim())
    }

    /// Reads a prompt file: frontmatter becomes generation parameters, the
    /// body becomes the instruction text, the path becomes the continuation
    /// source key. A missing file or blank body warns and falls through.
    fn read_prompt_file(&self, path: &str) -> Option<ResolvedPrompt> {
        if path.is_empty() {
            return None;
        }
        let resolved = if self.vault.exists(path) {
            path.to_string()
        } else {
            let with_ext = format!("{path}.md");
            if self.vault.exists(&with_ext) {
                with_ext
            } else {
                self.notifier
                    .notify(&format!("Prompt file not found: {path}"));
                tracing::warn!(path, "Prompt file not found, falling back");
                return None;
            }
        };

        let content = match self.vault.read(&resolved) {
            Ok(content) => content,
            Err(err) => {
                self.notifier
                    .notify(&format!("Could not read prompt file: {resolved}"));
                tracing::warn!(path = %resolved, error = %err, "Prompt file unreadable, falling back");
                return None;
            }
        };

        let (block, body) = split_frontmatter(&content);
        let text = body.trim();
        if text.is_empty() {
            self.notifier
                .notify(&format!("Prompt file is empty: {resolved}"));
            tracing::warn!(path = %resolved, "Prompt file has no body, falling back");
            return None;
        }

        let params = block.and_then(Frontmatter::parse).unwrap_or_default();
        Some(ResolvedPrompt {
            text: text.to_string(),
            model: params.get("model").and_then(value_string),
            num_ctx: params.get("num_ctx").and_then(value_u32_positive),
            is_continuous: params
                .get_aliased(CONTINUOUS_KEYS)
                .and_then(value_bool)
                .unwrap_or(false),
            include_links: params
                .get_aliased(INCLUDE_LINKS_KEYS)
                .and_then(value_bool)
                .unwrap_or(false),
            exclude_patterns: params
                .get_aliased(EXCLUDE_PATTERN_KEYS)
                .map(value_string_list)
                .map(compile_patterns)
                .unwrap_or_default(),
            source_path: Some(resolved),
            temperature: params
                .get_aliased(TEMPERATURE_KEYS)
                .and_then(value_f32)
                .filter(|t| *t >= 0.0),
            top_p: params
                .get_aliased(TOP_P_KEYS)
                .and_then(value_f32)
                .filter(|p| *p > 0.0),
            repeat_penalty: params
                .get_aliased(REPEAT_PENALTY_KEYS)
                .and_then(value_f32)
                .filter(|p| *p > 0.0),
        })
    }
}

/// Accepts either a plain string value or a mapping keyed by prompt key.
fn string_or_keyed(value: &Value, prompt_key: &str) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Mapping(map) => map
            .iter()
            .find(|(key, _)| key.as_str() == Some(prompt_key))
            .and_then(|(_, v)| value_string(v)),
        _ => None,
    }
}

/// String value, as-is.
fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Number, accepting numeric-looking strings.
fn value_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

/// Positive integer, accepting numeric-looking strings. Zero and negative
/// values fail the constraint and read as absent.
fn value_u32_positive(value: &Value) -> Option<u32> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.filter(|v| *v > 0)
}

/// Boolean, accepting "true"/"false" strings case-insensitively.
fn value_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Newline-delimited string or YAML sequence of strings.
fn value_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s.lines().map(ToString::to_string).collect(),
        Value::Sequence(seq) => seq.iter().filter_map(value_string).collect(),
        _ => Vec::new(),
    }
}

/// Compiled exclusion patterns for the settings' global pattern text.
#[must_use]
pub fn global_patterns(config: &MarginaliaConfig) -> Vec<Regex> {
    crate::services::patterns::compile_pattern_text(&config.exclude_patterns)
}
