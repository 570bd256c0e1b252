//! OpenAI-compatible provider implementation.
//!
//! Speaks the `/chat/completions` function-calling protocol: tools are sent
//! as `functions` with `function_call: "auto"`, the assistant answers with
//! either text or a single `function_call`, and tool output goes back as a
//! `role: "function"` message carrying the tool name.
//!
//! Works with OpenAI and any endpoint exposing the same API.

use std::time::Duration;

use async_trait::async_trait;
use ideaforge_core::error::ProviderError;
use ideaforge_core::message::{Message, Role};
use ideaforge_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider with a per-request timeout.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key, timeout)
    }

    /// Convert our Message types to the wire format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::Tool => "function".into(),
                },
                content: m.content.clone(),
                function_call: m.tool_call.as_ref().map(|tc| ApiFunctionCall {
                    name: tc.name.clone(),
                    arguments: tc.arguments.to_string(),
                }),
                name: m.tool_name.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to the wire format.
    fn to_api_functions(tools: &[ToolDefinition]) -> Vec<ApiFunctionDefinition> {
        tools
            .iter()
            .map(|t| ApiFunctionDefinition {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if !request.tools.is_empty() {
            body["functions"] = serde_json::json!(Self::to_api_functions(&request.tools));
            body["function_call"] = serde_json::json!("auto");
        }

        body
    }

    /// Turn the first choice into an assistant turn.
    fn to_turn(message: ApiMessage) -> Result<AssistantTurn, ProviderError> {
        match message.function_call {
            Some(call) => {
                let raw = call.arguments.trim();
                let arguments = if raw.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(raw).map_err(|e| {
                        ProviderError::MalformedResponse(format!(
                            "arguments for '{}' are not valid JSON: {e}",
                            call.name
                        ))
                    })?
                };
                Ok(AssistantTurn::ToolCall {
                    name: call.name,
                    arguments,
                })
            }
            None => Ok(AssistantTurn::Final {
                text: message.content.unwrap_or_default(),
            }),
        }
    }
}

fn status_error(status: u16, retry_after: Option<u64>, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(1),
        },
        401 | 403 => ProviderError::AuthenticationFailed(if body.is_empty() {
            "Invalid API key or insufficient permissions".into()
        } else {
            body
        }),
        400..=499 => ProviderError::BadRequest {
            status_code: status,
            message: body,
        },
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl ideaforge_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            functions = request.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(status_error(status, retry_after, error_body));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        let turn = Self::to_turn(choice.message)?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            turn,
            usage,
            model: api_response.model.unwrap_or(request.model),
        })
    }
}

// --- Wire types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    /// Always serialized; `null` on assistant function calls.
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    /// JSON-encoded arguments, as a string.
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionDefinition {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
