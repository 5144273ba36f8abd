//! Output rendering.

mod blockquote;

pub use blockquote::{format_blockquote, format_embed};
