//! Linked-content expansion.
//!
//! Walks a note's outgoing references and splices the linked content into the
//! document as nested quoted callouts. The walk is bounded (two levels of
//! embedding) and cycle-safe: a visited set is threaded through the recursion
//! so a note is never expanded twice within one top-level call, independent of
//! the depth limit.

use crate::models::LinkRef;
use crate::rendering::format_embed;
use crate::services::patterns::matches_any;
use crate::vault::Vault;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Maximum number of embedding levels expanded below the root note.
pub const MAX_EMBED_DEPTH: usize = 2;

/// Callout type used for spliced-in linked content.
pub const EMBED_CALLOUT_TYPE: &str = "embedded-note";

/// ATX heading line: markers, text, optional closing markers.
static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").unwrap_or_else(|_| unreachable!()));

/// Expands linked and embedded notes into quoted blocks.
pub struct LinkExpander<'a, V: Vault> {
    vault: &'a V,
    global_patterns: &'a [Regex],
}

impl<'a, V: Vault> LinkExpander<'a, V> {
    /// Creates an expander over a vault with the globally configured
    /// exclusion patterns.
    #[must_use]
    pub const fn new(vault: &'a V, global_patterns: &'a [Regex]) -> Self {
        Self {
            vault,
            global_patterns,
        }
    }

    /// Expands the outgoing references of `note_path`, appending each linked
    /// note's content as a quoted callout.
    ///
    /// Embeds are always expanded; plain links only when `include_links` is
    /// set. `extra_patterns` are the resolved prompt's own exclusions,
    /// unioned with the global set.
    #[must_use]
    pub fn expand(
        &self,
        note_path: &str,
        text: &str,
        include_links: bool,
        extra_patterns: &[Regex],
    ) -> String {
        let mut visited = HashSet::new();
        self.expand_at(note_path, text, include_links, extra_patterns, 0, &mut visited)
    }

    fn expand_at(
        &self,
        note_path: &str,
        text: &str,
        include_links: bool,
        extra_patterns: &[Regex],
        depth: usize,
        visited: &mut HashSet<String>,
    ) -> String {
        if depth >= MAX_EMBED_DEPTH || !self.vault.exists(note_path) {
            return text.to_string();
        }
        visited.insert(note_path.to_string());

        let mut out = text.to_string();
        let mut processed: HashSet<String> = HashSet::new();

        for link in self.vault.links(note_path) {
            if !link.embed && !include_links {
                continue;
            }
            if self.is_excluded(&link, extra_patterns) {
                tracing::debug!(target = %link.target, "Reference excluded by pattern");
                continue;
            }
            if !processed.insert(link.target.clone()) {
                continue;
            }

            let parsed = link.parsed_target();
            let Some(resolved) = self.vault.resolve_link_target(&parsed.path, note_path) else {
                tracing::debug!(target = %link.target, from = note_path, "Unresolvable link target");
                continue;
            };
            if visited.contains(&resolved) {
                tracing::debug!(note = %resolved, "Cycle detected, skipping");
                continue;
            }

            let content = match self.vault.read(&resolved) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(note = %resolved, error = %err, "Skipping unreadable linked note");
                    continue;
                }
            };

            let extracted = if let Some(block_id) = parsed.block_id() {
                extract_block_line(&content, block_id)
            } else if let Some(heading) = parsed.heading() {
                extract_heading_section(&content, heading)
            } else {
                Some(content)
            };
            let Some(extracted) = extracted else {
                tracing::debug!(target = %link.target, "Sub-target not found in linked note");
                continue;
            };

            let expanded = self.expand_at(
                &resolved,
                &extracted,
                include_links,
                extra_patterns,
                depth + 1,
                visited,
            );

            out.push_str("\n\n");
            out.push_str(&format_embed(
                &expanded,
                &link.target,
                depth,
                EMBED_CALLOUT_TYPE,
            ));
        }

        out
    }

    /// Any global or prompt-scoped pattern match excludes the reference.
    ///
    /// Patterns see the canonical `[display](target)` form as well as the
    /// display text and target on their own, so anchored patterns written
    /// against the link title behave as expected.
    fn is_excluded(&self, link: &LinkRef, extra_patterns: &[Regex]) -> bool {
        let canonical = link.canonical();
        let candidates = [canonical.as_str(), link.display_text(), link.target.as_str()];
        candidates.into_iter().any(|candidate| {
            matches_any(self.global_patterns, candidate) || matches_any(extra_patterns, candidate)
        })
    }
}

/// Extracts the section under the named heading: the lines after the heading
/// up to the next heading of equal-or-shallower level, or end of document.
///
/// Heading comparison is case-insensitive on trimmed text. Returns `None`
/// when the heading is not present.
#[must_use]
pub fn extract_heading_section(content: &str, heading: &str) -> Option<String> {
    let wanted = heading.trim().to_lowercase();
    let mut section: Vec<&str> = Vec::new();
    let mut level: Option<usize> = None;

    for line in content.split('\n') {
        if let Some(cap) = HEADING_LINE.captures(line) {
            let line_level = cap.get(1).map_or(0, |m| m.as_str().len());
            let text = cap.get(2).map_or("", |m| m.as_str());
            if let Some(open_level) = level {
                if line_level <= open_level {
                    break;
                }
            } else if text.trim().to_lowercase() == wanted {
                level = Some(line_level);
                continue;
            }
        }
        if level.is_some() {
            section.push(line);
        }
    }

    level.map(|_| section.join("\n").trim_matches('\n').to_string())
}

/// Extracts the single line carrying the `^block_id` marker, with the marker
/// removed. Returns `None` when no line carries it.
#[must_use]
pub fn extract_block_line(content: &str, block_id: &str) -> Option<String> {
    let marker = format!("^{block_id}");
    content.split('\n').find_map(|line| {
        let trimmed = line.trim_end();
        trimmed
            .strip_suffix(marker.as_str())
            .map(|before| before.trim_end().to_string())
    })
}
