//! # IdeaForge Core
//!
//! Domain types, traits, and error definitions for the IdeaForge roadmap agent.
//! This crate has **no HTTP or CLI dependencies**. It defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping the chat backend or data sources in tests
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod records;
pub mod reply;
pub mod retry;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ConversationError, Error, ProviderError, Result, ToolError};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{
    AssistantTurn, Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage,
};
pub use records::{Competitor, Document, DocumentSource, Issue, IssueSource};
pub use retry::{RetryError, RetryPolicy, Retryable};
pub use tool::{ParamType, ParameterSchema, ParameterSpec, Tool, ToolArgs, ToolRegistry};
