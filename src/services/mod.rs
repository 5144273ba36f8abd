//! Core engine services.
//!
//! The algorithms that prepare a document for generation: pattern
//! compilation, callout filtering, link expansion, prompt resolution, and the
//! orchestrator that ties them to the inference client.

mod callout_filter;
mod generation;
mod link_expander;
mod patterns;
mod prompt_resolver;

pub use callout_filter::filter_callouts;
pub use generation::GenerationService;
pub use link_expander::{
    EMBED_CALLOUT_TYPE, LinkExpander, MAX_EMBED_DEPTH, extract_block_line, extract_heading_section,
};
pub use patterns::{compile_pattern_text, compile_patterns, matches_any};
pub use prompt_resolver::{PromptResolver, global_patterns};
