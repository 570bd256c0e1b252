//! IdeaForge CLI: the main entry point.
//!
//! Commands:
//! - `run`     Full pipeline: docs + issues -> ideas.md / ideas.json
//! - `agent`   Let the model drive the tools toward a goal
//! - `tools`   Print the tool descriptors the model sees
//! - `doctor`  Report which configuration keys are set

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ideaforge_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "ideaforge",
    about = "IdeaForge: roadmap ideas from product docs and tickets",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./ideaforge.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full idea pipeline
    Run {
        /// Override the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rate each idea on the terminal afterwards
        #[arg(long)]
        rate: bool,
    },

    /// Let the model pick tools to reach a goal
    Agent {
        /// What the agent should achieve
        #[arg(short, long)]
        goal: Option<String>,

        /// Override the step ceiling
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_steps: Option<u32>,

        /// Feed tool failures back to the model instead of aborting
        #[arg(long)]
        report_tool_errors: bool,
    },

    /// Print the tool descriptors as JSON
    Tools,

    /// Diagnose configuration
    Doctor,
}

fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}"))?;
    tracing::debug!(?config, "Configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run { output, rate } => {
            let config = load_config(config_path)?;
            commands::run::run(&config, output, rate).await?
        }
        Commands::Agent {
            goal,
            max_steps,
            report_tool_errors,
        } => {
            let config = load_config(config_path)?;
            commands::agent::run(&config, goal, max_steps, report_tool_errors).await?
        }
        Commands::Tools => {
            let config = load_config(config_path)?;
            commands::tools::run(&config)?
        }
        Commands::Doctor => commands::doctor::run(config_path),
    }

    Ok(())
}
