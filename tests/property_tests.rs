//! Property-based tests for the text-preparation invariants.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Link parsing splits at the first `#` and round-trips
//! - Callout filtering is idempotent and a no-op with no excluded types
//! - Blockquote rendering quotes every line exactly once
//! - Pattern compilation never panics on arbitrary input

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use marginalia::models::LinkTarget;
use marginalia::rendering::{format_blockquote, format_embed};
use marginalia::services::{compile_pattern_text, filter_callouts};
use proptest::prelude::*;

const NO_TYPES: &[&str] = &[];

proptest! {
    /// Property: a link without `#` parses to itself with no subpath.
    #[test]
    fn prop_parse_without_hash(s in "[^#]{0,64}") {
        let target = LinkTarget::parse(&s);
        prop_assert_eq!(target.path, s);
        prop_assert!(target.subpath.is_none());
    }

    /// Property: `path#subpath` splits at the first `#` and reassembles.
    #[test]
    fn prop_parse_splits_at_first_hash(path in "[^#]{0,32}", sub in "[^#]{1,32}") {
        let raw = format!("{path}#{sub}");
        let target = LinkTarget::parse(&raw);
        prop_assert_eq!(&target.path, &path);
        prop_assert_eq!(target.subpath.as_deref(), Some(sub.as_str()));
        prop_assert_eq!(format!("{}#{}", target.path, sub), raw);
    }

    /// Property: filtering with no excluded types returns the input unchanged.
    #[test]
    fn prop_filter_no_types_is_identity(text in "[a-zA-Z0-9>! \\[\\]\\n]{0,400}") {
        prop_assert_eq!(filter_callouts(&text, NO_TYPES), text);
    }

    /// Property: callout filtering is idempotent.
    #[test]
    fn prop_filter_is_idempotent(
        text in proptest::collection::vec("(>{0,3} ?)?(\\[!(ai|note|quote)\\] )?[a-z ]{0,12}", 0..24),
        excluded in proptest::sample::subsequence(vec!["ai", "note"], 0..3),
    ) {
        let text = text.join("\n");
        let once = filter_callouts(&text, &excluded);
        let twice = filter_callouts(&once, &excluded);
        prop_assert_eq!(once, twice);
    }

    /// Property: the filtered text never gains lines.
    #[test]
    fn prop_filter_never_adds_lines(
        text in "[a-zA-Z0-9>! \\[\\]\\n]{0,300}",
        excluded in proptest::sample::subsequence(vec!["ai", "note", "quote"], 0..4),
    ) {
        let filtered = filter_callouts(&text, &excluded);
        prop_assert!(filtered.split('\n').count() <= text.split('\n').count());
    }

    /// Property: every line of a blockquote body starts with the quote prefix.
    #[test]
    fn prop_blockquote_prefixes_every_line(text in "[a-zA-Z \n]{0,200}") {
        let quoted = format_blockquote(&text, None);
        prop_assert_eq!(quoted.split('\n').count(), text.split('\n').count());
        for line in quoted.split('\n') {
            prop_assert!(line.starts_with("> "));
        }
    }

    /// Property: embed rendering adds exactly one header line and quotes the
    /// body at `depth + 1` markers.
    #[test]
    fn prop_embed_header_and_depth(
        text in "[a-z \n]{0,120}",
        target in "[A-Za-z0-9 ]{1,24}",
        depth in 0usize..4,
    ) {
        let rendered = format_embed(&text, &target, depth, "embedded-note");
        let prefix = format!("{} ", ">".repeat(depth + 1));
        let lines: Vec<&str> = rendered.split('\n').collect();
        prop_assert_eq!(lines.len(), text.split('\n').count() + 1);
        let header_prefix = format!("{}[!embedded-note] ", prefix);
        prop_assert!(lines[0].starts_with(&header_prefix));
        for line in &lines {
            prop_assert!(line.starts_with(&prefix));
        }
    }

    /// Property: pattern compilation never panics and never yields more
    /// patterns than input lines.
    #[test]
    fn prop_pattern_compile_total(raw in "[a-z()^$.\\[\\]\\n ]{0,200}") {
        let compiled = compile_pattern_text(&raw);
        prop_assert!(compiled.len() <= raw.lines().count());
    }
}
