//! Exclusion-pattern compilation.
//!
//! User-supplied link exclusion patterns arrive either as newline-delimited
//! settings text or as an explicit list from prompt-file frontmatter. Each
//! non-blank entry compiles to a regular expression; an entry that fails to
//! compile is dropped with a warning and never fails the caller.

use regex::Regex;

/// Compiles a list of pattern strings into regex matchers.
///
/// Blank entries are skipped. Invalid patterns are logged and dropped.
#[must_use]
pub fn compile_patterns<I, S>(patterns: I) -> Vec<Regex>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .filter_map(|raw| {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                return None;
            }
            match Regex::new(raw) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    tracing::warn!(pattern = raw, error = %err, "Dropping invalid exclusion pattern");
                    None
                }
            }
        })
        .collect()
}

/// Compiles newline-delimited pattern text into regex matchers.
///
/// Returns an empty list for empty input.
#[must_use]
pub fn compile_pattern_text(raw: &str) -> Vec<Regex> {
    compile_patterns(raw.lines())
}

/// Returns `true` if any pattern matches the candidate string.
#[must_use]
pub fn matches_any(patterns: &[Regex], candidate: &str) -> bool {
    patterns.iter().any(|p| p.is_match(candidate))
}
