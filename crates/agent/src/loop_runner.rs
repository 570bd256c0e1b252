//! The tool-calling agent loop.

use std::sync::Arc;

use ideaforge_config::ToolErrorPolicy;
use ideaforge_core::error::{Error, ToolError};
use ideaforge_core::message::{Conversation, Message, MessageToolCall};
use ideaforge_core::provider::{AssistantTurn, Provider, ProviderRequest};
use ideaforge_core::tool::ToolRegistry;
use serde_json::json;
use tracing::{debug, info, warn};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an AI agent that plans and executes tools to achieve a user goal.";

pub const DEFAULT_GOAL: &str = "Generate 3 high-impact roadmap ideas based on the project.";

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcome {
    /// The model answered.
    Final { text: String },
    /// The step ceiling was reached without an answer.
    Exhausted { steps: u32 },
}

/// The result of one agent run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub outcome: AgentOutcome,
    /// Tool calls executed
    pub steps: u32,
    pub conversation: Conversation,
}

impl AgentRun {
    /// The final answer, if the model gave one.
    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            AgentOutcome::Final { text } => Some(text),
            AgentOutcome::Exhausted { .. } => None,
        }
    }
}

/// Drives a single conversation: ask the model, run the tool it picks,
/// feed the result back, until it answers or the step ceiling is hit.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,

    tools: Arc<ToolRegistry>,

    model: String,

    temperature: Option<f32>,

    system_prompt: String,

    /// Tool calls allowed before the run ends as exhausted
    max_steps: u32,

    tool_errors: ToolErrorPolicy,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_steps: 5,
            tool_errors: ToolErrorPolicy::Abort,
        }
    }

    pub fn with_max_steps(mut self, max: u32) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tool_error_policy(mut self, policy: ToolErrorPolicy) -> Self {
        self.tool_errors = policy;
        self
    }

    fn request(&self, conversation: &Conversation) -> ProviderRequest {
        let request = ProviderRequest::new(&self.model, conversation.messages().to_vec())
            .with_tools(self.tools.describe());
        match self.temperature {
            Some(t) => request.with_temperature(t),
            None => request,
        }
    }

    /// Run the tool and serialize its output, or apply the error policy.
    async fn dispatch(&self, name: &str, arguments: serde_json::Value) -> Result<String, Error> {
        match self.tools.invoke(name, arguments).await {
            Ok(value) => Ok(serde_json::to_string(&value)?),
            Err(ToolError::Provider { source, .. }) => Err(Error::Provider(source)),
            Err(e) if self.tool_errors == ToolErrorPolicy::Report && e.is_reportable() => {
                warn!(tool = name, error = %e, "Reporting tool error to the model");
                Ok(json!({ "error": e.to_string() }).to_string())
            }
            Err(e) => Err(Error::Tool(e)),
        }
    }

    /// Run the loop for one goal.
    pub async fn run(&self, goal: &str) -> Result<AgentRun, Error> {
        let mut conversation = Conversation::seeded(&self.system_prompt, goal);
        let mut steps = 0u32;

        info!(
            conversation_id = %conversation.id,
            provider = self.provider.name(),
            max_steps = self.max_steps,
            "Starting agent run"
        );

        while steps < self.max_steps {
            debug!(
                step = steps + 1,
                messages = conversation.len(),
                estimated_tokens = conversation.estimated_tokens(),
                "Calling provider"
            );
            let response = self.provider.complete(self.request(&conversation)).await?;
            if let Some(usage) = &response.usage {
                debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    total_tokens = usage.total_tokens,
                    "Provider usage"
                );
            }

            match response.turn {
                AssistantTurn::Final { text } => {
                    conversation.push(Message::assistant(&text))?;
                    info!(steps, "Agent produced a final answer");
                    return Ok(AgentRun {
                        outcome: AgentOutcome::Final { text },
                        steps,
                        conversation,
                    });
                }
                AssistantTurn::ToolCall { name, arguments } => {
                    debug!(tool = %name, "Dispatching tool call");
                    let result = self.dispatch(&name, arguments.clone()).await?;
                    conversation.record_tool_exchange(MessageToolCall { name, arguments }, result)?;
                    steps += 1;
                }
            }
        }

        warn!(steps, "Step ceiling reached without a final answer");
        Ok(AgentRun {
            outcome: AgentOutcome::Exhausted { steps },
            steps,
            conversation,
        })
    }
}
