//! The IdeaForge agent.
//!
//! Two ways to get ideas out of the model:
//!
//! 1. **[`AgentLoop`]**: the model decides, turn by turn, which tool to call
//!    (fetch roadmap docs, fetch Jira issues, look up competitors). Each
//!    result is appended to the conversation before the next turn. The run
//!    ends on a final answer or when the step ceiling is reached.
//! 2. **[`Pipeline`]**: a fixed sequence. Retrieve documents and issues,
//!    ask the [`IdeaGenerator`] once, deduplicate, compose and export.

pub mod loop_runner;
pub mod pipeline;
pub mod reasoning;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentLoop, AgentOutcome, AgentRun, DEFAULT_GOAL, DEFAULT_SYSTEM_PROMPT};
pub use pipeline::{Pipeline, PipelineError, PipelineReport};
pub use reasoning::{IdeaGenerator, parse_ideas};
