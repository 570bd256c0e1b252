//! `ideaforge agent`: the tool-calling loop.

use std::sync::Arc;

use ideaforge_agent::{AgentLoop, AgentOutcome, DEFAULT_GOAL};
use ideaforge_config::{AppConfig, Requirement, ToolErrorPolicy};

/// Append the configured roadmap URL and project key so the model can pass
/// them to the tools.
fn goal_with_context(goal: &str, config: &AppConfig) -> String {
    let mut goal = goal.to_string();
    if let Some(url) = &config.roadmap.url {
        goal.push_str(&format!("\nRoadmap documentation: {url}"));
    }
    if let Some(key) = &config.jira.project_key {
        goal.push_str(&format!("\nJira project key: {key}"));
    }
    goal
}

pub async fn run(
    config: &AppConfig,
    goal: Option<String>,
    max_steps: Option<u32>,
    report_tool_errors: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    config.require(&[Requirement::Llm])?;

    let provider = ideaforge_providers::build_from_config(config)?;
    let tools = Arc::new(ideaforge_tools::default_registry(config, provider.clone())?);

    let policy = if report_tool_errors {
        ToolErrorPolicy::Report
    } else {
        config.agent.tool_errors
    };
    let agent = AgentLoop::new(provider, tools, &config.model)
        .with_max_steps(max_steps.unwrap_or(config.agent.max_steps))
        .with_tool_error_policy(policy);

    let goal = goal_with_context(goal.as_deref().unwrap_or(DEFAULT_GOAL), config);

    eprint!("  Thinking...");
    let run = agent.run(&goal).await;
    eprint!("\r              \r");

    match run?.outcome {
        AgentOutcome::Final { text } => println!("{text}"),
        AgentOutcome::Exhausted { steps } => {
            println!("  Step budget ran out after {steps} tool calls without a final answer.");
            println!("  Try --max-steps with a higher value.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_carries_configured_sources() {
        let mut config = AppConfig::default();
        config.roadmap.url = Some("https://docs.example.com".into());
        config.jira.project_key = Some("PRJ".into());

        let goal = goal_with_context("Find ideas", &config);
        assert_eq!(
            goal,
            "Find ideas\nRoadmap documentation: https://docs.example.com\nJira project key: PRJ"
        );
    }

    #[test]
    fn goal_unchanged_without_sources() {
        assert_eq!(goal_with_context(DEFAULT_GOAL, &AppConfig::default()), DEFAULT_GOAL);
    }
}
