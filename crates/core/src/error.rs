//! Error types for the IdeaForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all IdeaForge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Conversation protocol errors ---
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Filesystem ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error(
        "Rate limited by provider, retry after {retry_after_secs}s \
         (check that the API key has quota or billing credit attached)"
    )]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request rejected: {message} (status: {status_code})")]
    BadRequest { status_code: u16, message: String },

    #[error("Malformed response from provider: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: Box<ProviderError> },
}

impl ProviderError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Timeouts, connection failures, 5xx responses and rate limits are
    /// transient. Auth failures, rejected requests and malformed payloads
    /// will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_)
            | ProviderError::Network(_)
            | ProviderError::RateLimited { .. } => true,
            ProviderError::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl crate::retry::Retryable for ProviderError {
    fn is_transient(&self) -> bool {
        ProviderError::is_transient(self)
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Tool not configured: {0}")]
    NotConfigured(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    /// A tool's own model call failed. Never reported back to the model.
    #[error("Tool {tool_name} could not reach the model: {source}")]
    Provider {
        tool_name: String,
        #[source]
        source: ProviderError,
    },
}

impl ToolError {
    /// Errors the model could fix by calling again with different arguments,
    /// or that stem from a collaborator failing at runtime.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            ToolError::InvalidArguments { .. } | ToolError::ExecutionFailed { .. }
        )
    }
}

/// Violations of the call/result pairing rules of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("Tool result for '{0}' has no pending tool call")]
    OrphanToolResult(String),

    #[error("Tool result for '{got}' does not match pending call '{expected}'")]
    MismatchedToolResult { expected: String, got: String },

    #[error("Tool call '{0}' is still awaiting its result")]
    UnresolvedToolCall(String),
}
