//! Turns raw model ideas into structured, exportable proposals.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{UNTITLED, non_empty_str};

/// Fields mirrored from the raw idea into `metadata`.
const METADATA_KEYS: [&str; 4] = ["problem", "proposal", "business_value", "confidence_score"];

/// A structured idea ready for export and rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedIdea {
    /// UUID v4
    pub id: String,
    pub title: String,
    pub problem: Option<String>,
    pub proposal: Option<String>,
    pub business_value: Option<String>,
    pub confidence_score: Option<f64>,
    /// Markdown rendering of the fields above
    pub markdown: String,
    /// Raw values of the mirrored fields, `null` when absent
    pub metadata: Map<String, Value>,
}

/// Text of a field that may be a string or any other JSON scalar.
fn field_text(idea: &Value, key: &str) -> Option<String> {
    match idea.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(other) => Some(other.to_string()),
    }
}

fn confidence(idea: &Value) -> Option<f64> {
    match idea.get("confidence_score")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn render_markdown(idea: &ComposedIdea) -> String {
    let mut md = format!("## {}\n", idea.title);
    let sections = [
        ("Problem", idea.problem.as_deref()),
        ("Proposal", idea.proposal.as_deref()),
        ("Business value", idea.business_value.as_deref()),
    ];
    for (label, text) in sections {
        if let Some(text) = text {
            md.push_str(&format!("\n**{label}:** {text}\n"));
        }
    }
    if let Some(score) = idea.confidence_score {
        md.push_str(&format!("\n**Confidence:** {score:.2}\n"));
    }
    md
}

fn compose_one(idea: &Value) -> Option<ComposedIdea> {
    let object = idea.as_object()?;

    let title = non_empty_str(idea, "title")
        .or_else(|| non_empty_str(idea, "summary"))
        .unwrap_or(UNTITLED)
        .to_string();

    let metadata = METADATA_KEYS
        .iter()
        .map(|key| (key.to_string(), object.get(*key).cloned().unwrap_or(Value::Null)))
        .collect();

    let mut composed = ComposedIdea {
        id: Uuid::new_v4().to_string(),
        title,
        problem: field_text(idea, "problem"),
        proposal: field_text(idea, "proposal"),
        business_value: field_text(idea, "business_value"),
        confidence_score: confidence(idea),
        markdown: String::new(),
        metadata,
    };
    composed.markdown = render_markdown(&composed);
    Some(composed)
}

/// Compose every JSON object in `ideas`, in order. Anything that is not an
/// object is dropped.
pub fn compose(ideas: &[Value]) -> Vec<ComposedIdea> {
    ideas.iter().filter_map(compose_one).collect()
}
