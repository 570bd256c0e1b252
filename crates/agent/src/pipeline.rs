//! The fixed idea pipeline: retrieve, reason, dedup, compose, export.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ideaforge_core::error::Error;
use ideaforge_core::records::{DocumentSource, IssueSource};
use ideaforge_ideas::{ComposedIdea, DedupChecker, ExportError, compose, export_json, export_markdown};
use thiserror::Error;
use tracing::info;

use crate::reasoning::IdeaGenerator;

pub const MARKDOWN_FILE: &str = "ideas.md";
pub const JSON_FILE: &str = "ideas.json";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// What one pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub documents: usize,
    pub issues: usize,
    /// Raw ideas before deduplication
    pub generated: usize,
    pub ideas: Vec<ComposedIdea>,
    pub markdown_path: PathBuf,
    pub json_path: PathBuf,
}

/// Runs the stages in order. Owns its seen-idea index, so repeated runs on
/// the same pipeline never emit a title twice.
pub struct Pipeline {
    documents: Arc<dyn DocumentSource>,
    issues: Arc<dyn IssueSource>,
    generator: IdeaGenerator,
    roadmap_url: String,
    project_key: String,
    output_dir: PathBuf,
    dedup: DedupChecker,
}

impl Pipeline {
    pub fn new(
        documents: Arc<dyn DocumentSource>,
        issues: Arc<dyn IssueSource>,
        generator: IdeaGenerator,
        roadmap_url: impl Into<String>,
        project_key: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            documents,
            issues,
            generator,
            roadmap_url: roadmap_url.into(),
            project_key: project_key.into(),
            output_dir: output_dir.into(),
            dedup: DedupChecker::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn run(&mut self) -> Result<PipelineReport, PipelineError> {
        info!(url = %self.roadmap_url, project = %self.project_key, "Starting idea pipeline");

        let docs = self.documents.fetch_documents(&self.roadmap_url).await?;
        info!(count = docs.len(), "Retrieved roadmap documents");

        let jql = format!("project={}", self.project_key);
        let issues = self.issues.fetch_issues(&jql, usize::MAX).await?;
        info!(count = issues.len(), "Retrieved existing issues");

        let raw = self.generator.generate(&docs, &issues).await?;
        let generated = raw.len();
        let unique = self.dedup.filter(raw);
        let ideas = compose(&unique);

        let markdown_path = self.output_dir.join(MARKDOWN_FILE);
        let json_path = self.output_dir.join(JSON_FILE);
        let titles: Vec<&str> = ideas.iter().map(|i| i.title.as_str()).collect();
        export_markdown(&titles, &markdown_path)?;
        export_json(&ideas, &json_path)?;

        info!(generated, kept = ideas.len(), "Pipeline finished");
        Ok(PipelineReport {
            documents: docs.len(),
            issues: issues.len(),
            generated,
            ideas,
            markdown_path,
            json_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use async_trait::async_trait;
    use ideaforge_core::error::ToolError;
    use ideaforge_core::records::{Document, Issue};
    use std::sync::Mutex;

    struct FakeDocs;

    #[async_trait]
    impl DocumentSource for FakeDocs {
        async fn fetch_documents(&self, root_url: &str) -> ideaforge_core::Result<Vec<Document>> {
            Ok(vec![Document {
                title: "Roadmap".into(),
                url: root_url.into(),
                content: "We plan to ship offline sync.".into(),
            }])
        }
    }

    #[derive(Default)]
    struct FakeIssues {
        queries: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl IssueSource for FakeIssues {
        async fn fetch_issues(
            &self,
            jql: &str,
            max_results: usize,
        ) -> ideaforge_core::Result<Vec<Issue>> {
            self.queries.lock().unwrap().push((jql.into(), max_results));
            Ok(vec![Issue {
                key: "PRJ-1".into(),
                summary: Some("Dark mode".into()),
                description: None,
                status: Some("Open".into()),
                labels: vec![],
            }])
        }
    }

    struct BrokenIssues;

    #[async_trait]
    impl IssueSource for BrokenIssues {
        async fn fetch_issues(&self, _jql: &str, _max: usize) -> ideaforge_core::Result<Vec<Issue>> {
            Err(ToolError::NotConfigured("JIRA_URL".into()).into())
        }
    }

    const REPLY: &str = r#"[
        {"title": "Offline mode", "problem": "No network on planes", "confidence_score": 0.9},
        {"title": "offline MODE ", "proposal": "duplicate"},
        {"summary": "Bulk export"},
        "not an idea"
    ]"#;

    fn pipeline(issues: Arc<dyn IssueSource>, replies: usize, dir: &Path) -> Pipeline {
        let provider = Arc::new(SequentialMockProvider::new(vec![final_text(REPLY); replies]));
        Pipeline::new(
            Arc::new(FakeDocs),
            issues,
            IdeaGenerator::new(provider, "gpt-4o"),
            "https://docs.example.com/roadmap",
            "PRJ",
            dir,
        )
    }

    #[tokio::test]
    async fn run_dedups_composes_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let issues = Arc::new(FakeIssues::default());
        let mut pipeline = pipeline(issues.clone(), 1, dir.path());

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.documents, 1);
        assert_eq!(report.issues, 1);
        assert_eq!(report.generated, 4);
        let titles: Vec<&str> = report.ideas.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Offline mode", "Bulk export"]);

        assert_eq!(
            issues.queries.lock().unwrap().as_slice(),
            &[("project=PRJ".to_string(), usize::MAX)]
        );

        assert_eq!(
            std::fs::read_to_string(dir.path().join(MARKDOWN_FILE)).unwrap(),
            "- Offline mode\n- Bulk export\n"
        );
        let exported: Vec<ComposedIdea> =
            serde_json::from_str(&std::fs::read_to_string(&report.json_path).unwrap()).unwrap();
        assert_eq!(exported, report.ideas);
    }

    #[tokio::test]
    async fn second_run_skips_already_seen_titles() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(Arc::new(FakeIssues::default()), 2, dir.path());

        pipeline.run().await.unwrap();
        let second = pipeline.run().await.unwrap();

        assert_eq!(second.generated, 4);
        assert!(second.ideas.is_empty());
    }

    #[tokio::test]
    async fn source_failure_aborts_before_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(Arc::new(BrokenIssues), 1, dir.path());

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Core(Error::Tool(ToolError::NotConfigured(_)))));
        assert!(!dir.path().join(MARKDOWN_FILE).exists());
    }
}
