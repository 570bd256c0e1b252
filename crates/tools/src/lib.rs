//! Data-source tools for IdeaForge.
//!
//! Tools give the agent the ability to gather planning input:
//! crawl roadmap documentation, search Jira, and ask the model about
//! competitors. The crawler and the Jira client double as the pipeline's
//! document and issue sources.

pub mod competitors;
pub mod http;
pub mod jira;
pub mod roadmap;

use std::sync::Arc;

use ideaforge_config::AppConfig;
use ideaforge_core::error::ToolError;
use ideaforge_core::provider::Provider;
use ideaforge_core::tool::ToolRegistry;

pub use competitors::FetchCompetitorsTool;
pub use http::{FetchError, HttpFetcher};
pub use jira::{FetchJiraTool, JiraClient};
pub use roadmap::{DocumentRetriever, FetchRoadmapTool, HtmlScraper};

fn not_configured(e: FetchError) -> ToolError {
    ToolError::NotConfigured(e.to_string())
}

/// The shared GET client: configured timeout and retry policy.
pub fn build_fetcher(config: &AppConfig) -> Result<HttpFetcher, ToolError> {
    HttpFetcher::new(config.http.timeout(), config.retry.to_policy()).map_err(not_configured)
}

pub fn build_document_retriever(config: &AppConfig) -> Result<DocumentRetriever, ToolError> {
    DocumentRetriever::new(build_fetcher(config)?, config.roadmap.max_pages).map_err(not_configured)
}

/// The Jira client, or `None` when URL or token is missing.
pub fn build_jira_client(config: &AppConfig) -> Result<Option<JiraClient>, ToolError> {
    Ok(JiraClient::from_config(&config.jira, build_fetcher(config)?))
}

/// Create the tool registry the agent loop runs against.
///
/// Every tool is always registered so the descriptors the model sees are
/// stable; `fetch_jira` fails as not configured when Jira settings are absent.
pub fn default_registry(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(FetchRoadmapTool::new(Arc::new(
        build_document_retriever(config)?,
    ))))?;
    registry.register(Box::new(FetchJiraTool::new(
        build_jira_client(config)?.map(Arc::new),
    )))?;
    registry.register(Box::new(FetchCompetitorsTool::new(
        provider,
        config.model.clone(),
    )))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ideaforge_core::error::ProviderError;
    use ideaforge_core::provider::{ProviderRequest, ProviderResponse};

    struct NullProvider;

    #[async_trait]
    impl Provider for NullProvider {
        fn name(&self) -> &str {
            "null"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("null".into()))
        }
    }

    #[test]
    fn default_registry_has_all_tools() {
        let registry = default_registry(&AppConfig::default(), Arc::new(NullProvider)).unwrap();
        assert_eq!(
            registry.names(),
            vec!["fetch_competitors", "fetch_jira", "fetch_roadmap"]
        );
    }

    #[test]
    fn descriptors_declare_required_parameters() {
        let registry = default_registry(&AppConfig::default(), Arc::new(NullProvider)).unwrap();
        let defs = registry.describe();
        let required: Vec<serde_json::Value> =
            defs.iter().map(|d| d.parameters["required"].clone()).collect();
        assert_eq!(
            required,
            vec![
                serde_json::json!(["product_name"]),
                serde_json::json!(["jql"]),
                serde_json::json!(["roadmap_url"]),
            ]
        );
    }
}
