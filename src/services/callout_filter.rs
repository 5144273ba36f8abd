//! Callout filtering.
//!
//! Removes callout blocks of excluded types from note text before it is sent
//! to the model. Generated answers are inserted into notes as callouts, so
//! without this pass a second generation would feed the model its own prior
//! output.
//!
//! The scanner is a small explicit state machine over quote-depth-classified
//! lines. Exclusion opens at an excluded callout header and swallows every
//! deeper line; same-depth lines are lazy continuations and are swallowed too,
//! unless a blank line has intervened and the line is itself a new callout
//! header, which is then re-examined from scratch. Any shallower line ends
//! exclusion.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Callout header marker in quoted content, e.g. `[!quote]` or `[!ai]- title`.
static CALLOUT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[!([^\]]+)\][+-]?").unwrap_or_else(|_| unreachable!()));

/// Scanner state: either passing lines through or skipping an excluded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Lines are kept; excluded headers open a skip region.
    Normal,
    /// Inside an excluded callout that opened at `depth` markers.
    Skipping {
        /// Marker count of the excluded header.
        depth: usize,
        /// Whether a blank line has been seen since the last dropped content.
        saw_blank: bool,
    },
}

/// A line classified by quote depth.
struct ScannedLine<'a> {
    /// Number of leading `>` markers, tolerant of `>>` and `> >` spacing.
    depth: usize,
    /// Content after the markers and their trailing spacing.
    content: &'a str,
    /// Whether the whole line is whitespace.
    blank: bool,
}

impl<'a> ScannedLine<'a> {
    fn parse(line: &'a str) -> Self {
        let blank = line.trim().is_empty();
        let mut depth = 0;
        let mut rest = line.trim_start_matches([' ', '\t']);
        while let Some(after) = rest.strip_prefix('>') {
            depth += 1;
            rest = after.trim_start_matches([' ', '\t']);
        }
        Self {
            depth,
            content: rest,
            blank,
        }
    }

    /// The lowercased callout type when this line is a callout header.
    fn callout_type(&self) -> Option<String> {
        if self.depth == 0 {
            return None;
        }
        CALLOUT_HEADER
            .captures(self.content)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().trim().to_lowercase())
    }
}

/// Removes lines belonging to callouts of the excluded types.
///
/// Type comparison is case-insensitive. An empty excluded set returns the
/// input unchanged. The pass is idempotent: filtering already-filtered text
/// with the same excluded types yields the same text.
#[must_use]
pub fn filter_callouts<S: AsRef<str>>(text: &str, excluded_types: &[S]) -> String {
    let excluded: HashSet<String> = excluded_types
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if excluded.is_empty() {
        return text.to_string();
    }

    let mut state = ScanState::Normal;
    let mut kept: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let scanned = ScannedLine::parse(line);
        let header = scanned.callout_type();

        loop {
            match state {
                ScanState::Normal => {
                    if let Some(ref kind) = header {
                        if excluded.contains(kind) {
                            state = ScanState::Skipping {
                                depth: scanned.depth,
                                saw_blank: false,
                            };
                            break;
                        }
                    }
                    kept.push(line);
                    break;
                }
                ScanState::Skipping { depth, saw_blank } => {
                    if scanned.blank {
                        state = ScanState::Skipping {
                            depth,
                            saw_blank: true,
                        };
                        break;
                    }
                    let resumes_sibling =
                        scanned.depth == depth && saw_blank && header.is_some();
                    if scanned.depth < depth || resumes_sibling {
                        // Exclusion over; re-examine this line from scratch.
                        state = ScanState::Normal;
                        continue;
                    }
                    state = ScanState::Skipping {
                        depth,
                        saw_blank: false,
                    };
                    break;
                }
            }
        }
    }

    kept.join("\n")
}
