//! `ideaforge run`: the fixed pipeline, optionally followed by ratings.

use std::path::PathBuf;
use std::sync::Arc;

use ideaforge_agent::{IdeaGenerator, Pipeline};
use ideaforge_config::{AppConfig, Requirement};
use ideaforge_ideas::{collect_ratings, save_ratings};

pub const FEEDBACK_FILE: &str = "feedback.json";

pub async fn run(
    config: &AppConfig,
    output: Option<PathBuf>,
    rate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    config.require(&[
        Requirement::Llm,
        Requirement::Roadmap,
        Requirement::Jira,
        Requirement::JiraProject,
    ])?;

    let provider = ideaforge_providers::build_from_config(config)?;
    let documents = ideaforge_tools::build_document_retriever(config)?;
    let issues = ideaforge_tools::build_jira_client(config)?.ok_or("Jira is not configured")?;

    let roadmap_url = config.roadmap.url.clone().ok_or("ROADMAP_URL is not set")?;
    let project_key = config
        .jira
        .project_key
        .clone()
        .ok_or("JIRA_PROJECT_KEY is not set")?;
    let output_dir = output.unwrap_or_else(|| config.output.dir.clone());

    let generator =
        IdeaGenerator::new(provider, &config.model).with_temperature(config.temperature);
    let mut pipeline = Pipeline::new(
        Arc::new(documents),
        Arc::new(issues),
        generator,
        roadmap_url,
        project_key,
        output_dir,
    );

    let report = pipeline.run().await?;

    println!();
    println!(
        "  {} documents, {} existing issues, {} ideas proposed, {} kept",
        report.documents,
        report.issues,
        report.generated,
        report.ideas.len()
    );
    for idea in &report.ideas {
        println!("    - {}", idea.title);
    }
    println!();
    println!("  Markdown: {}", report.markdown_path.display());
    println!("  JSON:     {}", report.json_path.display());

    if rate && !report.ideas.is_empty() {
        println!();
        let ratings = collect_ratings(
            &report.ideas,
            std::io::stdin().lock(),
            std::io::stdout().lock(),
        )?;
        let path = pipeline.output_dir().join(FEEDBACK_FILE);
        save_ratings(&ratings, &path)?;
        println!("  Feedback: {}", path.display());
    }

    Ok(())
}
