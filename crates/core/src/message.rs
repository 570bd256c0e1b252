//! Message and Conversation domain types.
//!
//! The conversation is the agent loop's only memory: an append-only log of
//! role-tagged messages sent whole to the provider on every turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConversationError;

/// Unique identifier for a conversation (one agent run).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Fixed instructions
    System,
    /// The goal
    User,
    /// The model, either answering or requesting a tool
    Assistant,
    /// Output of a tool the assistant asked for
    Tool,
}

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Name of the tool to invoke
    pub name: String,

    /// Parsed arguments
    pub arguments: serde_json::Value,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// Text content; `None` on assistant tool-call messages
    pub content: Option<String>,

    /// Tool requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<MessageToolCall>,

    /// For tool results, the tool that produced them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn build(
        role: Role,
        content: Option<String>,
        tool_call: Option<MessageToolCall>,
        tool_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_call,
            tool_name,
            timestamp: Utc::now(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::build(Role::System, Some(content.into()), None, None)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::build(Role::User, Some(content.into()), None, None)
    }

    /// Create a new assistant text message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::build(Role::Assistant, Some(content.into()), None, None)
    }

    /// Create an assistant message requesting a tool. Content is null.
    pub fn tool_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::build(
            Role::Assistant,
            None,
            Some(MessageToolCall {
                name: name.into(),
                arguments,
            }),
            None,
        )
    }

    /// Create a tool result message.
    pub fn tool_result(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::build(Role::Tool, Some(content.into()), None, Some(tool_name.into()))
    }

    /// The text content, or an empty string for tool-call messages.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// An append-only, totally ordered message log.
///
/// Every assistant tool call must be followed immediately by exactly one
/// tool result carrying the same tool name. Appends that would break this
/// are rejected; nothing is ever reordered or removed.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    messages: Vec<Message>,

    #[serde(skip)]
    pending_call: Option<String>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            pending_call: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a conversation seeded with a system instruction and a goal.
    pub fn seeded(system_prompt: impl Into<String>, goal: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.messages.push(Message::system(system_prompt));
        conv.messages.push(Message::user(goal));
        conv
    }

    /// Append a message, enforcing call/result pairing.
    pub fn push(&mut self, message: Message) -> Result<(), ConversationError> {
        match (self.pending_call.as_deref(), message.role) {
            (Some(expected), Role::Tool) => {
                let got = message.tool_name.as_deref().unwrap_or_default();
                if got != expected {
                    return Err(ConversationError::MismatchedToolResult {
                        expected: expected.to_string(),
                        got: got.to_string(),
                    });
                }
                self.pending_call = None;
            }
            (None, Role::Tool) => {
                return Err(ConversationError::OrphanToolResult(
                    message.tool_name.clone().unwrap_or_default(),
                ));
            }
            (Some(expected), _) => {
                return Err(ConversationError::UnresolvedToolCall(expected.to_string()));
            }
            (None, _) => {
                if let Some(call) = &message.tool_call {
                    self.pending_call = Some(call.name.clone());
                }
            }
        }

        self.updated_at = Utc::now();
        self.messages.push(message);
        Ok(())
    }

    /// Append an assistant tool call together with its result, as one
    /// adjacent pair.
    pub fn record_tool_exchange(
        &mut self,
        call: MessageToolCall,
        result: impl Into<String>,
    ) -> Result<(), ConversationError> {
        let name = call.name.clone();
        self.push(Message::tool_call(call.name, call.arguments))?;
        self.push(Message::tool_result(name, result))
    }

    /// All messages, in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The tool call still awaiting its result, if any.
    pub fn pending_call(&self) -> Option<&str> {
        self.pending_call.as_deref()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the total token count estimate (rough: 4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.messages.iter().map(|m| m.text().len() / 4).sum()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
