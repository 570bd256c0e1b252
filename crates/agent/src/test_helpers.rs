//! Shared test helpers for agent tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use ideaforge_core::error::{ProviderError, ToolError};
use ideaforge_core::provider::{AssistantTurn, Provider, ProviderRequest, ProviderResponse};
use ideaforge_core::tool::{ParamType, ParameterSchema, Tool, ToolArgs};
use serde_json::{Value, json};

/// A mock provider that replays scripted turns and records every request.
///
/// Panics if more calls are made than turns provided.
pub struct SequentialMockProvider {
    turns: Mutex<VecDeque<Result<AssistantTurn, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(turns: Vec<AssistantTurn>) -> Self {
        Self::with_results(turns.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<AssistantTurn, ProviderError>>) -> Self {
        Self {
            turns: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that only ever asks for `name` with `args`.
    pub fn always_calling(name: &str, args: Value, times: usize) -> Self {
        Self::new(vec![tool_call(name, args); times])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("SequentialMockProvider: no more turns (call #{call})"))?;
        Ok(ProviderResponse {
            turn,
            usage: None,
            model: "mock-model".into(),
        })
    }
}

pub fn final_text(text: &str) -> AssistantTurn {
    AssistantTurn::Final { text: text.into() }
}

pub fn tool_call(name: &str, arguments: Value) -> AssistantTurn {
    AssistantTurn::ToolCall {
        name: name.into(),
        arguments,
    }
}

/// Echoes its `text` argument back as `{"echo": text}`.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the input back"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required("text", ParamType::String, "Text to echo")
    }

    async fn execute(&self, args: ToolArgs) -> Result<Value, ToolError> {
        Ok(json!({ "echo": args.str("text")? }))
    }
}

/// Always fails at runtime.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "flaky"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "flaky".into(),
            reason: "upstream returned 503".into(),
        })
    }
}

/// A tool whose own model call never gets through.
pub struct UnreachableModelTool;

#[async_trait]
impl Tool for UnreachableModelTool {
    fn name(&self) -> &str {
        "ask_model"
    }

    fn description(&self) -> &str {
        "Asks the model a side question"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value, ToolError> {
        Err(ToolError::Provider {
            tool_name: "ask_model".into(),
            source: ProviderError::Unavailable {
                attempts: 4,
                last_error: Box::new(ProviderError::RateLimited {
                    retry_after_secs: 1,
                }),
            },
        })
    }
}
