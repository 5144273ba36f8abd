//! CLI command implementations.
//!
//! Rendering and config-path helpers for the `marginalia` binary. The binary
//! itself owns argument parsing and printing; everything here returns strings
//! so it stays testable.

use crate::config::MarginaliaConfig;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Renders the configured prompt slots as a listing.
#[must_use]
pub fn render_prompt_list(config: &MarginaliaConfig) -> String {
    let mut keys: Vec<&String> = config.prompts.keys().collect();
    keys.sort();

    let mut out = String::new();
    for key in keys {
        let Some(slot) = config.prompts.get(key) else {
            continue;
        };
        let _ = writeln!(out, "{key}: {}", slot.display_label);
        if let Some(file) = &slot.prompt_file {
            let _ = writeln!(out, "  prompt file: {file}");
        }
        if let Some(heading) = &slot.callout_heading {
            let _ = writeln!(out, "  callout heading: {heading}");
        }
        let excluded = slot.excluded_callout_types();
        if !excluded.is_empty() {
            let _ = writeln!(out, "  excluded callouts: {}", excluded.join(", "));
        }
    }
    out
}

/// Renders the configuration and connectivity summary for `status`.
#[must_use]
pub fn render_status(config: &MarginaliaConfig, reachable: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Endpoint: {}", config.endpoint);
    let _ = writeln!(
        out,
        "Model: {}",
        config.model.as_deref().unwrap_or("(not configured)")
    );
    if let Some(keep_alive) = &config.keep_alive {
        let _ = writeln!(out, "Keep alive: {keep_alive}");
    }
    let pattern_count = config
        .exclude_patterns
        .lines()
        .filter(|l| !l.trim().is_empty())
        .count();
    let _ = writeln!(out, "Global exclusion patterns: {pattern_count}");
    let _ = writeln!(out, "Prompt slots: {}", config.prompts.len());
    let server = if reachable {
        "reachable"
    } else {
        "unreachable"
    };
    let _ = writeln!(out, "Inference server: {server}");
    out
}

/// The default location for a persisted config file.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("marginalia").join("config.toml"))
}
