//! `ideaforge doctor`: report which settings each command is missing.

use std::path::Path;

use ideaforge_config::{AppConfig, DEFAULT_CONFIG_FILE, Requirement};

const CHECKS: [(Requirement, &str); 4] = [
    (Requirement::Llm, "Chat model credentials"),
    (Requirement::Roadmap, "Roadmap documentation URL"),
    (Requirement::Jira, "Jira endpoint and token"),
    (Requirement::JiraProject, "Jira project key"),
];

pub fn run(config_path: Option<&Path>) {
    println!("IdeaForge Doctor");
    println!("================\n");

    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    if path.exists() {
        println!("  ✅ Config file: {}", path.display());
    } else {
        println!("  ℹ️  No config file at {}, using defaults + environment", path.display());
    }

    let config = match AppConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            return;
        }
    };

    let mut issues = 0;
    for (requirement, label) in CHECKS {
        let missing = config.missing_for(requirement);
        if missing.is_empty() {
            println!("  ✅ {label}");
        } else {
            println!("  ⚠️  {label}: missing {}", missing.join(", "));
            issues += 1;
        }
    }

    println!();
    println!("  Model:      {}", config.model);
    println!("  API base:   {}", config.api_base_url);
    println!("  Max steps:  {}", config.agent.max_steps);
    println!("  Output dir: {}", config.output.dir.display());

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. `run` needs all of the above; `agent` needs the chat model.");
    }
}
