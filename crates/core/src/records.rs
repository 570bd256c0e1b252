//! Records exchanged between the data sources, the tools and the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One crawled documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// One issue-tracker ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// A competing product as reported by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// Where product documentation comes from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_documents(&self, root_url: &str) -> Result<Vec<Document>>;
}

/// Where existing tickets come from.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetch up to `max_results` issues matching `jql`.
    async fn fetch_issues(&self, jql: &str, max_results: usize) -> Result<Vec<Issue>>;
}
