//! Integration tests for link expansion and callout filtering over a real
//! vault directory.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::uninlined_format_args
)]

use marginalia::services::{LinkExpander, compile_pattern_text, filter_callouts};
use marginalia::vault::{FsVault, Vault};
use regex::Regex;
use std::fs;
use tempfile::TempDir;

const NO_PATTERNS: &[Regex] = &[];

fn vault_with(files: &[(&str, &str)]) -> (TempDir, FsVault) {
    let dir = TempDir::new().expect("temp dir");
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(full, content).expect("write note");
    }
    let vault = FsVault::new(dir.path());
    (dir, vault)
}

#[test]
fn test_end_to_end_hello_linked() {
    let (_dir, vault) = vault_with(&[
        ("note.md", "Hello [[Linked]]"),
        ("Linked.md", "World"),
    ]);
    let expander = LinkExpander::new(&vault, NO_PATTERNS);
    let expanded = expander.expand("note.md", "Hello [[Linked]]", true, NO_PATTERNS);

    assert!(expanded.contains("Hello [[Linked]]"));
    assert!(expanded.contains("> [!embedded-note] Linked\n> World"));
}

#[test]
fn test_cycle_graph_terminates_with_single_occurrences() {
    let (_dir, vault) = vault_with(&[
        ("A.md", "alpha ![[B]]"),
        ("B.md", "bravo ![[C]]"),
        ("C.md", "charlie ![[A]]"),
    ]);
    let expander = LinkExpander::new(&vault, NO_PATTERNS);
    let expanded = expander.expand("A.md", "alpha ![[B]]", false, NO_PATTERNS);

    assert_eq!(expanded.matches("bravo").count(), 1);
    assert_eq!(expanded.matches("charlie").count(), 1);
    // The cycle back to A never re-expands A's content.
    assert_eq!(expanded.matches("alpha").count(), 1);
}

#[test]
fn test_exclusion_patterns_filter_links() {
    let (_dir, vault) = vault_with(&[
        ("note.md", "irrelevant"),
        ("notes/draft.md", "draft body"),
        ("notes/done.md", "done body"),
    ]);
    let patterns = compile_pattern_text("^TODO");
    let expander = LinkExpander::new(&vault, &patterns);
    let text = "[TODO: draft](notes/draft.md) and [Done](notes/done.md)";
    let expanded = expander.expand("note.md", text, true, NO_PATTERNS);

    assert!(!expanded.contains("draft body"));
    assert!(expanded.contains("done body"));
}

#[test]
fn test_heading_extraction_through_embed() {
    let (_dir, vault) = vault_with(&[
        ("journal.md", "![[Reference#Key Points]]"),
        (
            "Reference.md",
            "# Reference\nintro text\n## Key Points\npoint one\npoint two\n## Other\nignored",
        ),
    ]);
    let expander = LinkExpander::new(&vault, NO_PATTERNS);
    let expanded = expander.expand("journal.md", "![[Reference#Key Points]]", false, NO_PATTERNS);

    assert!(expanded.contains("> point one\n> point two"));
    assert!(!expanded.contains("intro text"));
    assert!(!expanded.contains("ignored"));
}

#[test]
fn test_expand_then_filter_removes_prior_answers() {
    // A note with a previous AI answer links to a clean reference note. The
    // prepared document keeps the reference content and drops the old answer.
    let note_body = "Today was busy.\n\n> [!ai] Reflection\n> Old answer here.\n\n![[Context]]";
    let (_dir, vault) = vault_with(&[
        ("today.md", note_body),
        ("Context.md", "Background facts."),
    ]);
    let expander = LinkExpander::new(&vault, NO_PATTERNS);
    let expanded = expander.expand("today.md", note_body, false, NO_PATTERNS);
    let filtered = filter_callouts(&expanded, &["ai"]);

    assert!(filtered.contains("Today was busy."));
    assert!(filtered.contains("Background facts."));
    assert!(!filtered.contains("Old answer here."));
    // The embedded-note callout survives because its type is not excluded.
    assert!(filtered.contains("[!embedded-note] Context"));
}

#[test]
fn test_filtering_expanded_embeds_by_type() {
    let (_dir, vault) = vault_with(&[
        ("note.md", "body ![[Other]]"),
        ("Other.md", "other body"),
    ]);
    let expander = LinkExpander::new(&vault, NO_PATTERNS);
    let expanded = expander.expand("note.md", "body ![[Other]]", false, NO_PATTERNS);
    // Excluding the embed callout type strips everything that was spliced in.
    let filtered = filter_callouts(&expanded, &["embedded-note"]);

    assert!(filtered.contains("body ![[Other]]"));
    assert!(!filtered.contains("other body"));
}

#[test]
fn test_nested_embeds_reach_two_levels() {
    let (_dir, vault) = vault_with(&[
        ("root.md", "r ![[Mid]]"),
        ("Mid.md", "m ![[Leaf]]"),
        ("Leaf.md", "l ![[Beyond]]"),
        ("Beyond.md", "too deep"),
    ]);
    let expander = LinkExpander::new(&vault, NO_PATTERNS);
    let expanded = expander.expand("root.md", "r ![[Mid]]", false, NO_PATTERNS);

    assert!(expanded.contains("m ![[Leaf]]"));
    assert!(expanded.contains("l ![[Beyond]]"));
    assert!(!expanded.contains("too deep"));
}

#[test]
fn test_subpath_block_reference() {
    let (_dir, vault) = vault_with(&[
        ("note.md", "![[Source#^key-line]]"),
        ("Source.md", "above\nthe important line ^key-line\nbelow"),
    ]);
    let expander = LinkExpander::new(&vault, NO_PATTERNS);
    let expanded = expander.expand("note.md", "![[Source#^key-line]]", false, NO_PATTERNS);

    assert!(expanded.contains("> the important line"));
    assert!(!expanded.contains("above"));
    assert!(!expanded.contains("below"));
}

#[test]
fn test_vault_scan_matches_expander_view() {
    let (_dir, vault) = vault_with(&[(
        "note.md",
        "[[One]] ![[Two]] [ext](https://example.com)\n```\n[[code]]\n```\n",
    )]);
    let links = vault.links("note.md");
    let targets: Vec<&str> = links.iter().map(|l| l.target.as_str()).collect();
    assert_eq!(targets, vec!["One", "Two"]);
}
