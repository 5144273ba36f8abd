//! Link reference models.
//!
//! A link inside a note is carried around in two shapes: the raw [`LinkRef`]
//! discovered by the vault scan (target text, optional display alias, embed
//! flag) and the parsed [`LinkTarget`] that splits the target into a note
//! path and an optional heading or block sub-target.

/// A parsed link target: note path plus optional `#subpath`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// The note path portion, before any `#`.
    pub path: String,
    /// The sub-target after the first `#`, if present and non-empty.
    ///
    /// A leading `^` marks a block identifier; anything else names a heading.
    pub subpath: Option<String>,
}

impl LinkTarget {
    /// Parses a raw link string into path and optional subpath.
    ///
    /// Splits at the first `#`. No `#` (or an empty remainder) means the
    /// whole input is the path. Always succeeds.
    #[must_use]
    pub fn parse(link: &str) -> Self {
        match link.split_once('#') {
            Some((path, subpath)) if !subpath.is_empty() => Self {
                path: path.to_string(),
                subpath: Some(subpath.to_string()),
            },
            Some((path, _)) => Self {
                path: path.to_string(),
                subpath: None,
            },
            None => Self {
                path: link.to_string(),
                subpath: None,
            },
        }
    }

    /// Returns the block identifier if the subpath is a `^block` reference.
    #[must_use]
    pub fn block_id(&self) -> Option<&str> {
        self.subpath.as_deref().and_then(|s| s.strip_prefix('^'))
    }

    /// Returns the heading name if the subpath names a heading.
    #[must_use]
    pub fn heading(&self) -> Option<&str> {
        self.subpath
            .as_deref()
            .filter(|s| !s.starts_with('^'))
    }
}

/// An outgoing reference discovered in a note's content.
///
/// Derived from the vault's content scan; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    /// The raw link target, path plus optional `#subpath`.
    pub target: String,
    /// The display alias, when the link carries one.
    pub display: Option<String>,
    /// Whether the link is an embed (transclusion) rather than a plain link.
    pub embed: bool,
}

impl LinkRef {
    /// Creates a plain link reference.
    #[must_use]
    pub fn new(target: impl Into<String>, display: Option<String>) -> Self {
        Self {
            target: target.into(),
            display,
            embed: false,
        }
    }

    /// Creates an embed reference.
    #[must_use]
    pub fn embed(target: impl Into<String>, display: Option<String>) -> Self {
        Self {
            target: target.into(),
            display,
            embed: true,
        }
    }

    /// The text shown for this link: the alias when present, else the target.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.target)
    }

    /// Canonical `[display](target)` form used for exclusion-pattern matching.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("[{}]({})", self.display_text(), self.target)
    }

    /// Parses the target into path and subpath.
    #[must_use]
    pub fn parsed_target(&self) -> LinkTarget {
        LinkTarget::parse(&self.target)
    }
}
