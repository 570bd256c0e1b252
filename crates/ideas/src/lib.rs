//! Idea post-processing for IdeaForge.
//!
//! Raw ideas are whatever JSON the model produced. They flow through the
//! [`dedup`] filter, are enriched once by the [`composer`], then written out
//! by [`export`] and optionally rated through [`feedback`]. None of these
//! steps mutate an idea in place.

pub mod composer;
pub mod dedup;
pub mod export;
pub mod feedback;

use serde_json::Value;

pub use composer::{ComposedIdea, compose};
pub use dedup::DedupChecker;
pub use export::{ExportError, export_json, export_markdown};
pub use feedback::{FeedbackError, Rating, collect_ratings, save_ratings};

/// Fallback title for ideas that carry neither `title` nor `summary`.
pub const UNTITLED: &str = "Untitled idea";

fn non_empty_str<'a>(idea: &'a Value, key: &str) -> Option<&'a str> {
    idea.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// The text an idea is known by: `title`, else `summary`, else the idea's
/// own string form (a bare string, or the JSON text of anything else).
pub fn display_title(idea: &Value) -> String {
    if let Some(text) = non_empty_str(idea, "title").or_else(|| non_empty_str(idea, "summary")) {
        return text.to_string();
    }
    match idea {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
