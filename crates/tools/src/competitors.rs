//! `fetch_competitors` tool: asks the model for a competitor list.

use std::sync::Arc;

use async_trait::async_trait;
use ideaforge_core::error::ToolError;
use ideaforge_core::message::Message;
use ideaforge_core::provider::{AssistantTurn, Provider, ProviderRequest};
use ideaforge_core::records::Competitor;
use ideaforge_core::reply::parse_json_reply;
use ideaforge_core::tool::{ParamType, ParameterSchema, Tool, ToolArgs};
use serde_json::Value;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are an AI assistant with the ability to search the web for \
    market intelligence. Your task is to find competitors for a given product or website.";

pub struct FetchCompetitorsTool {
    provider: Arc<dyn Provider>,
    model: String,
}

impl FetchCompetitorsTool {
    pub const NAME: &'static str = "fetch_competitors";

    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    fn user_prompt(product: &str, max_results: u64) -> String {
        format!(
            "Find the top {max_results} competitors for the product or domain '{product}'. \
             For each competitor, provide its name, website URL, and a concise description. \
             Respond strictly in JSON as a list of objects with keys 'name', 'url', 'description'."
        )
    }
}

/// Read a competitor list from the model's reply. Anything that is not a
/// JSON array of objects yields an empty list.
pub fn parse_competitors(reply: &str) -> Vec<Competitor> {
    match parse_json_reply(reply) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => {
            warn!("Competitor reply was not a JSON list; returning no competitors");
            Vec::new()
        }
    }
}

#[async_trait]
impl Tool for FetchCompetitorsTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Find the main competitors of a product or domain and return each \
         competitor's name, website URL and a short description."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required(
                "product_name",
                ParamType::String,
                "Product or domain to find competitors for",
            )
            .optional(
                "max_results",
                ParamType::Integer,
                "Number of competitors to return (default 5)",
            )
    }

    async fn execute(&self, arguments: ToolArgs) -> Result<Value, ToolError> {
        let product = arguments.str("product_name")?;
        let max_results = arguments.u64_or("max_results", 5)?;

        let request = ProviderRequest::new(
            self.model.clone(),
            vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(Self::user_prompt(product, max_results)),
            ],
        );
        let response =
            self.provider
                .complete(request)
                .await
                .map_err(|source| ToolError::Provider {
                    tool_name: Self::NAME.into(),
                    source,
                })?;

        let reply = match response.turn {
            AssistantTurn::Final { text } => text,
            AssistantTurn::ToolCall { name, .. } => {
                debug!(tool = %name, "Model asked for a tool instead of answering");
                String::new()
            }
        };

        let mut competitors = parse_competitors(&reply);
        competitors.truncate(max_results as usize);
        serde_json::to_value(competitors).map_err(|e| ToolError::ExecutionFailed {
            tool_name: Self::NAME.into(),
            reason: e.to_string(),
        })
    }
}
