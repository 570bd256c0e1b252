//! Tool trait and registry: the capabilities the model can ask for.
//!
//! Each tool declares a typed [`ParameterSchema`]. The registry validates
//! the model's arguments against it before the tool runs, so a bad call is
//! rejected with [`ToolError::InvalidArguments`] without any I/O.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Whether `value` is of this JSON type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

/// A single named parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

/// The parameters a tool accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    params: Vec<ParameterSpec>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter.
    pub fn required(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.params.push(ParameterSpec {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        });
        self
    }

    /// Add an optional parameter.
    pub fn optional(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.params.push(ParameterSpec {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        });
        self
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Wire form:
    /// `{"type": "object", "properties": {..}, "required": [..]}`.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            properties.insert(
                p.name.clone(),
                serde_json::json!({
                    "type": p.kind.as_str(),
                    "description": p.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check `arguments` against the schema.
    ///
    /// `null` counts as "no arguments". Required parameters must be present,
    /// non-null and, for strings, non-empty. Every declared parameter that
    /// is present must have the declared type. Undeclared keys are ignored.
    pub fn validate(&self, tool: &str, arguments: Value) -> Result<ToolArgs, ToolError> {
        let map = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::InvalidArguments {
                    tool: tool.into(),
                    reason: format!("arguments must be a JSON object, got {other}"),
                });
            }
        };

        for p in &self.params {
            match map.get(&p.name) {
                None | Some(Value::Null) if p.required => {
                    return Err(ToolError::InvalidArguments {
                        tool: tool.into(),
                        reason: format!("missing required parameter '{}'", p.name),
                    });
                }
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if p.required && s.trim().is_empty() => {
                    return Err(ToolError::InvalidArguments {
                        tool: tool.into(),
                        reason: format!("parameter '{}' must not be empty", p.name),
                    });
                }
                Some(v) if !p.kind.accepts(v) => {
                    return Err(ToolError::InvalidArguments {
                        tool: tool.into(),
                        reason: format!(
                            "parameter '{}' must be of type {}",
                            p.name,
                            p.kind.as_str()
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(ToolArgs {
            tool: tool.into(),
            values: map,
        })
    }
}

/// Arguments that passed schema validation, with typed accessors.
#[derive(Debug, Clone)]
pub struct ToolArgs {
    tool: String,
    values: Map<String, Value>,
}

impl ToolArgs {
    fn invalid(&self, reason: String) -> ToolError {
        ToolError::InvalidArguments {
            tool: self.tool.clone(),
            reason,
        }
    }

    /// A required, non-empty string parameter.
    pub fn str(&self, name: &str) -> Result<&str, ToolError> {
        match self.values.get(name) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
            Some(Value::String(_)) => {
                Err(self.invalid(format!("parameter '{name}' must not be empty")))
            }
            Some(Value::Null) | None => {
                Err(self.invalid(format!("missing required parameter '{name}'")))
            }
            Some(_) => Err(self.invalid(format!("parameter '{name}' must be a string"))),
        }
    }

    /// An optional non-negative integer parameter.
    pub fn opt_u64(&self, name: &str) -> Result<Option<u64>, ToolError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.invalid(format!("parameter '{name}' must be a non-negative integer"))),
        }
    }

    /// An optional integer parameter with a default.
    pub fn u64_or(&self, name: &str, default: u64) -> Result<u64, ToolError> {
        Ok(self.opt_u64(name)?.unwrap_or(default))
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// The core Tool trait.
///
/// Tools are registered in the [`ToolRegistry`] and made available to the
/// agent loop. `execute` only ever sees arguments that passed the schema.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "fetch_jira").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// The parameters this tool accepts.
    fn parameters(&self) -> ParameterSchema;

    /// Execute the tool, returning structured data.
    async fn execute(&self, arguments: ToolArgs) -> Result<Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters().to_json(),
        }
    }
}

/// A registry of available tools, keyed by unique name.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Validate and execute tools when the LLM requests them
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions, sorted by name.
    pub fn describe(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Validate `arguments` against the named tool's schema, then run it.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args = tool.parameters().validate(name, arguments)?;
        tool.execute(args).await
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A simple test tool that echoes its input and counts executions.
    struct EchoTool {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::new()
                .required("text", ParamType::String, "Text to echo")
                .optional("times", ParamType::Integer, "Repetitions")
        }
        async fn execute(&self, arguments: ToolArgs) -> Result<Value, ToolError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let text = arguments.str("text")?;
            let times = arguments.u64_or("times", 1)?;
            Ok(json!(vec![text; times as usize]))
        }
    }

    fn registry() -> (ToolRegistry, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry
            .register(Box::new(EchoTool { runs: runs.clone() }))
            .unwrap();
        (registry, runs)
    }

    #[test]
    fn registry_register_and_lookup() {
        let (registry, _) = registry();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn duplicate_registration_rejected() {
        let (mut registry, runs) = registry();
        let err = registry.register(Box::new(EchoTool { runs })).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateTool(name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn describe_emits_wire_schema() {
        let (registry, _) = registry();
        let defs = registry.describe();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].parameters["type"], "object");
        assert_eq!(defs[0].parameters["properties"]["text"]["type"], "string");
        assert_eq!(defs[0].parameters["properties"]["times"]["type"], "integer");
        assert_eq!(defs[0].parameters["required"], json!(["text"]));
    }

    #[test]
    fn describe_is_stable() {
        let (registry, _) = registry();
        assert_eq!(registry.describe(), registry.describe());
    }

    #[tokio::test]
    async fn registry_invokes_tool() {
        let (registry, runs) = registry();
        let result = registry
            .invoke("echo", json!({"text": "hi", "times": 2}))
            .await
            .unwrap();
        assert_eq!(result, json!(["hi", "hi"]));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_tool_rejected() {
        let (registry, runs) = registry();
        let err = registry.invoke("nonexistent", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_required_parameter_rejected_before_execution() {
        let (registry, runs) = registry();
        let err = registry.invoke("echo", json!({"times": 2})).await.unwrap_err();
        match err {
            ToolError::InvalidArguments { tool, reason } => {
                assert_eq!(tool, "echo");
                assert!(reason.contains("'text'"));
            }
            other => panic!("Expected InvalidArguments, got: {other:?}"),
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_type_rejected() {
        let (registry, _) = registry();
        let err = registry
            .invoke("echo", json!({"text": "hi", "times": "two"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn empty_required_string_rejected() {
        let (registry, _) = registry();
        let err = registry.invoke("echo", json!({"text": "  "})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn null_arguments_treated_as_empty() {
        let schema = ParameterSchema::new().optional("n", ParamType::Integer, "n");
        let args = schema.validate("t", Value::Null).unwrap();
        assert_eq!(args.u64_or("n", 7).unwrap(), 7);
    }

    #[test]
    fn non_object_arguments_rejected() {
        let schema = ParameterSchema::new();
        assert!(schema.validate("t", json!([1, 2])).is_err());
    }
}
