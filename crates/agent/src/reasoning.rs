//! One-shot idea generation over retrieved documents and issues.

use std::sync::Arc;

use ideaforge_core::error::Error;
use ideaforge_core::message::Message;
use ideaforge_core::provider::{AssistantTurn, Provider, ProviderRequest};
use ideaforge_core::records::{Document, Issue};
use ideaforge_core::reply::parse_json_reply;
use serde_json::Value;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are an expert product manager tasked with generating new roadmap \
ideas. The suggestions must not overlap with existing JIRA ideas.";

const INSTRUCTIONS: &str = "Generate 2-3 new roadmap ideas in JSON format. Each idea must contain \
the keys 'title', 'problem', 'proposal', 'business_value', and 'confidence_score'.";

fn user_prompt(docs: &[Document], issues: &[Issue]) -> String {
    let doc_text = docs
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let existing = issues
        .iter()
        .map(|i| format!("- {}", i.summary.as_deref().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Documentation:\n{doc_text}\n\nExisting JIRA ideas:\n{existing}\n\n{INSTRUCTIONS}")
}

/// Raw ideas from a model reply. A single object becomes a one-element
/// list; anything unusable becomes an empty list.
pub fn parse_ideas(reply: &str) -> Vec<Value> {
    match parse_json_reply(reply) {
        Some(Value::Array(ideas)) => ideas,
        Some(idea @ Value::Object(_)) => vec![idea],
        Some(other) => {
            warn!(kind = %json_kind(&other), "Model returned JSON that is not an idea list");
            Vec::new()
        }
        None => {
            warn!("Model reply was not valid JSON; no ideas generated");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Asks the model for new roadmap ideas that avoid the existing issues.
pub struct IdeaGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
}

impl IdeaGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Generate raw ideas. Provider failures propagate; an unusable reply
    /// yields an empty list.
    pub async fn generate(&self, docs: &[Document], issues: &[Issue]) -> Result<Vec<Value>, Error> {
        let request = ProviderRequest::new(
            &self.model,
            vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(user_prompt(docs, issues)),
            ],
        )
        .with_temperature(self.temperature);

        debug!(docs = docs.len(), issues = issues.len(), "Requesting ideas");
        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(total_tokens = usage.total_tokens, "Idea generation usage");
        }

        let ideas = match response.turn {
            AssistantTurn::Final { text } => parse_ideas(&text),
            AssistantTurn::ToolCall { name, .. } => {
                warn!(tool = %name, "Model asked for a tool during idea generation");
                Vec::new()
            }
        };
        debug!(count = ideas.len(), "Model proposed ideas");
        Ok(ideas)
    }
}
