//! Blockquote and callout rendering.
//!
//! Two deterministic renderers: [`format_blockquote`] decorates a generated
//! answer for insertion into the note, and [`format_embed`] splices linked
//! content in as a callout whose nesting depth is encoded by the number of
//! leading `>` markers.

/// Renders text as a quoted block, optionally headed by a callout line.
///
/// Every line of `text` is prefixed with `"> "`. When `heading` is given, a
/// `"> {heading}"` line is inserted first.
#[must_use]
pub fn format_blockquote(text: &str, heading: Option<&str>) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    if let Some(heading) = heading {
        out.push_str("> ");
        out.push_str(heading);
        out.push('\n');
    }
    push_quoted_lines(&mut out, text, "> ");
    out
}

/// Renders embedded note content as a nested callout.
///
/// Every line is prefixed with `depth + 1` repetitions of `>` followed by a
/// space; the first line is a callout header naming the link target, e.g.
/// `> [!quote] Note A` at depth 0 or `>> [!quote] Note A` at depth 1.
#[must_use]
pub fn format_embed(text: &str, link_target: &str, depth: usize, callout_type: &str) -> String {
    let markers = ">".repeat(depth + 1);
    let prefix = format!("{markers} ");

    let mut out = String::with_capacity(text.len() + 64);
    out.push_str(&prefix);
    out.push_str(&format!("[!{callout_type}] {link_target}"));
    out.push('\n');
    push_quoted_lines(&mut out, text, &prefix);
    out
}

/// Appends each line of `text` prefixed with `prefix`, newline-separated.
fn push_quoted_lines(out: &mut String, text: &str, prefix: &str) {
    let mut first = true;
    for line in text.split('\n') {
        if !first {
            out.push('\n');
        }
        first = false;
        out.push_str(prefix);
        out.push_str(line);
    }
}
