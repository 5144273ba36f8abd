//! Configuration management.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Key of the built-in prompt slot that cannot be removed.
pub const DEFAULT_PROMPT_KEY: &str = "reflection";

/// Default endpoint of the local inference server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Main configuration for marginalia.
#[derive(Debug, Clone)]
pub struct MarginaliaConfig {
    /// Inference server endpoint.
    pub endpoint: String,
    /// Model name used when a prompt supplies no override.
    pub model: Option<String>,
    /// `keep_alive` value passed through to the inference server.
    pub keep_alive: Option<String>,
    /// Global link-exclusion patterns, newline-delimited.
    pub exclude_patterns: String,
    /// Prompt slots keyed by their stable prompt key.
    pub prompts: HashMap<String, PromptSlot>,
}

/// A persisted, user-editable prompt slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptSlot {
    /// Human-readable label shown in command listings.
    pub display_label: String,
    /// Vault-relative path to the prompt file, when one is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_file: Option<String>,
    /// Callout heading prepended to generated output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callout_heading: Option<String>,
    /// Callout types stripped from the input text, newline-delimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_callout_types: Option<String>,
}

impl PromptSlot {
    /// The excluded callout types as a trimmed list.
    #[must_use]
    pub fn excluded_callout_types(&self) -> Vec<String> {
        self.exclude_callout_types
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Inference server endpoint.
    pub endpoint: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// Keep-alive value.
    pub keep_alive: Option<String>,
    /// Global exclusion patterns, newline-delimited.
    pub exclude_patterns: Option<String>,
    /// Prompt slots.
    #[serde(default)]
    pub prompts: HashMap<String, PromptSlot>,
}

impl Default for MarginaliaConfig {
    fn default() -> Self {
        let mut prompts = HashMap::new();
        prompts.insert(DEFAULT_PROMPT_KEY.to_string(), Self::built_in_slot());
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: None,
            keep_alive: None,
            exclude_patterns: String::new(),
            prompts,
        }
    }
}

impl MarginaliaConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in prompt slot installed on first run.
    #[must_use]
    pub fn built_in_slot() -> PromptSlot {
        PromptSlot {
            display_label: "Reflect on this entry".to_string(),
            prompt_file: None,
            callout_heading: Some("[!ai] Reflection".to_string()),
            exclude_callout_types: Some("ai".to_string()),
        }
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: e.to_string(),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/marginalia/` on macOS)
    /// 2. XDG config dir (`~/.config/marginalia/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs
            .config_dir()
            .join("marginalia")
            .join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("marginalia")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `MarginaliaConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(endpoint) = file.endpoint {
            config.endpoint = endpoint;
        }
        config.model = file.model;
        config.keep_alive = file.keep_alive;
        if let Some(patterns) = file.exclude_patterns {
            config.exclude_patterns = patterns;
        }
        config.prompts.extend(file.prompts);
        config
            .prompts
            .entry(DEFAULT_PROMPT_KEY.to_string())
            .or_insert_with(Self::built_in_slot);

        config
    }

    /// Persists the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = ConfigFile {
            endpoint: Some(self.endpoint.clone()),
            model: self.model.clone(),
            keep_alive: self.keep_alive.clone(),
            exclude_patterns: if self.exclude_patterns.is_empty() {
                None
            } else {
                Some(self.exclude_patterns.clone())
            },
            prompts: self.prompts.clone(),
        };
        let rendered = toml::to_string_pretty(&file).map_err(|e| Error::OperationFailed {
            operation: "serialize_config".to_string(),
            cause: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::write(path, rendered).map_err(|e| Error::OperationFailed {
            operation: "write_config_file".to_string(),
            cause: e.to_string(),
        })
    }

    /// Adds or replaces a prompt slot.
    pub fn add_prompt(&mut self, key: impl Into<String>, slot: PromptSlot) {
        self.prompts.insert(key.into(), slot);
    }

    /// Removes a prompt slot.
    ///
    /// # Errors
    ///
    /// Returns an error when the key names the protected built-in slot or no
    /// slot with that key exists.
    pub fn remove_prompt(&mut self, key: &str) -> Result<()> {
        if key == DEFAULT_PROMPT_KEY {
            return Err(Error::Configuration(format!(
                "the built-in '{DEFAULT_PROMPT_KEY}' prompt cannot be removed"
            )));
        }
        if self.prompts.remove(key).is_none() {
            return Err(Error::InvalidInput(format!("no prompt named '{key}'")));
        }
        Ok(())
    }

    /// Sets the inference endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the global exclusion patterns.
    #[must_use]
    pub fn with_exclude_patterns(mut self, patterns: impl Into<String>) -> Self {
        self.exclude_patterns = patterns.into();
        self
    }
}
