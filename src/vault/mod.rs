//! Vault access.
//!
//! The engine never touches the filesystem directly; it goes through the
//! [`Vault`] trait, which supplies raw note text, parsed frontmatter, link
//! resolution, and the outgoing-reference scan. [`FsVault`] implements the
//! trait over a directory of markdown files.

mod fs;

pub use fs::FsVault;

use crate::models::LinkRef;
use crate::Result;
use regex::Regex;
use serde_yaml_ng::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Creates a compile-time verified regex wrapped in [`LazyLock`].
macro_rules! lazy_regex {
    ($pattern:expr) => {
        LazyLock::new(|| Regex::new($pattern).unwrap_or_else(|_| unreachable!()))
    };
}

/// Wiki-style links and embeds: `[[target]]`, `[[target|alias]]`, `![[target]]`.
static WIKI_LINK: LazyLock<Regex> =
    lazy_regex!(r"(!?)\[\[([^\[\]|]+)(?:\|([^\[\]]+))?\]\]");

/// Markdown links and embeds: `[text](target)`, `![alt](target)`.
static MARKDOWN_LINK: LazyLock<Regex> = lazy_regex!(r"(!?)\[([^\]]*)\]\(([^()\s]+)\)");

/// Fenced code block regions (backtick syntax).
static CODE_BLOCK_BACKTICK: LazyLock<Regex> = lazy_regex!(r"```[a-zA-Z0-9_-]*\n?[\s\S]*?```");

/// Fenced code block regions (tilde syntax).
static CODE_BLOCK_TILDE: LazyLock<Regex> = lazy_regex!(r"~~~[a-zA-Z0-9_-]*\n?[\s\S]*?~~~");

/// Read access to a vault of notes.
///
/// Paths are vault-relative with forward slashes. Implementations must be
/// tolerant collaborators: a missing file is an `Err` from [`Vault::read`],
/// absent frontmatter is `None`, and an unresolvable link is `None`.
pub trait Vault {
    /// Reads the full content of a note.
    fn read(&self, path: &str) -> Result<String>;

    /// Returns `true` if the note exists.
    fn exists(&self, path: &str) -> bool;

    /// Resolves a raw link target to a concrete note path, relative to the
    /// linking note. Returns `None` when no note matches.
    fn resolve_link_target(&self, raw: &str, from: &str) -> Option<String>;

    /// Parsed frontmatter of a note, when present and well-formed.
    fn frontmatter(&self, path: &str) -> Option<Frontmatter> {
        let content = self.read(path).ok()?;
        let (block, _) = split_frontmatter(&content);
        block.and_then(Frontmatter::parse)
    }

    /// Outgoing references of a note, in encounter order.
    fn links(&self, path: &str) -> Vec<LinkRef> {
        self.read(path).map(|c| scan_links(&c)).unwrap_or_default()
    }
}

/// Parsed frontmatter: a flat key/value map of YAML values.
#[derive(Debug, Clone, Default)]
pub struct Frontmatter(HashMap<String, Value>);

impl Frontmatter {
    /// Parses a YAML frontmatter block. Returns `None` when the block is not
    /// a mapping or fails to parse; malformed frontmatter is never fatal.
    #[must_use]
    pub fn parse(yaml: &str) -> Option<Self> {
        match serde_yaml_ng::from_str::<HashMap<String, Value>>(yaml) {
            Ok(map) => Some(Self(map)),
            Err(err) => {
                tracing::debug!(error = %err, "Ignoring malformed frontmatter block");
                None
            }
        }
    }

    /// Looks up a raw value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Looks up a value trying several alias keys in order.
    #[must_use]
    pub fn get_aliased(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.0.get(*k))
    }

    /// Returns `true` when no keys are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Splits note content into its frontmatter block and the body.
///
/// Frontmatter is a leading `---` line, YAML content, and a closing `---` (or
/// `...`) line. Without a well-formed block the whole input is the body.
#[must_use]
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"));
    let Some(rest) = rest else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(block), body);
        }
        offset += line.len();
    }
    (None, content)
}

/// Byte region of a fenced code block.
#[derive(Debug, Clone, Copy)]
struct CodeRegion {
    start: usize,
    end: usize,
}

/// Detects fenced code block regions (backtick and tilde syntax), sorted by
/// start position. References inside these regions are not collected.
fn code_regions(content: &str) -> Vec<CodeRegion> {
    let mut regions: Vec<CodeRegion> = CODE_BLOCK_BACKTICK
        .find_iter(content)
        .chain(CODE_BLOCK_TILDE.find_iter(content))
        .map(|m| CodeRegion {
            start: m.start(),
            end: m.end(),
        })
        .collect();
    regions.sort_by_key(|r| r.start);
    regions
}

fn in_code_region(position: usize, regions: &[CodeRegion]) -> bool {
    regions
        .iter()
        .any(|r| position >= r.start && position < r.end)
}

/// Returns `true` for targets that point outside the vault.
fn is_external_target(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("mailto:")
}

/// Scans note content for outgoing references, in encounter order.
///
/// Collects wiki-links (`[[target]]`, `[[target|alias]]`), wiki embeds
/// (`![[target]]`), and markdown links/embeds with vault-internal targets.
/// References inside fenced code blocks are ignored.
#[must_use]
pub fn scan_links(content: &str) -> Vec<LinkRef> {
    let regions = code_regions(content);
    let mut found: Vec<(usize, LinkRef)> = Vec::new();

    for cap in WIKI_LINK.captures_iter(content) {
        let Some(whole) = cap.get(0) else { continue };
        if in_code_region(whole.start(), &regions) {
            continue;
        }
        let embed = cap.get(1).is_some_and(|m| !m.as_str().is_empty());
        let Some(target) = cap.get(2).map(|m| m.as_str().trim()) else {
            continue;
        };
        if target.is_empty() {
            continue;
        }
        let display = cap
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .filter(|d| !d.is_empty());
        let link = if embed {
            LinkRef::embed(target, display)
        } else {
            LinkRef::new(target, display)
        };
        found.push((whole.start(), link));
    }

    for cap in MARKDOWN_LINK.captures_iter(content) {
        let Some(whole) = cap.get(0) else { continue };
        if in_code_region(whole.start(), &regions) {
            continue;
        }
        let Some(target) = cap.get(3).map(|m| m.as_str().trim()) else {
            continue;
        };
        if target.is_empty() || is_external_target(target) {
            continue;
        }
        let embed = cap.get(1).is_some_and(|m| !m.as_str().is_empty());
        let display = cap
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|d| !d.is_empty());
        let link = if embed {
            LinkRef::embed(target, display)
        } else {
            LinkRef::new(target, display)
        };
        found.push((whole.start(), link));
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, link)| link).collect()
}
