//! Jira issue search client and the `fetch_jira` tool.

use std::sync::Arc;

use async_trait::async_trait;
use ideaforge_config::JiraSection;
use ideaforge_core::error::{Error, ToolError};
use ideaforge_core::records::{Issue, IssueSource};
use ideaforge_core::tool::{ParamType, ParameterSchema, Tool, ToolArgs};
use serde::Deserialize;
use tracing::{debug, info};

use crate::http::{FetchError, HttpFetcher};

const SEARCH_FIELDS: &str = "summary,description,status,labels";

/// Paginating client for `GET /rest/api/2/search`.
pub struct JiraClient {
    base_url: String,
    token: String,
    username: Option<String>,
    page_size: usize,
    fetcher: HttpFetcher,
}

impl JiraClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        username: Option<String>,
        fetcher: HttpFetcher,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            username,
            page_size: 50,
            fetcher,
        }
    }

    /// Build from the `[jira]` section; `None` when URL or token is missing.
    pub fn from_config(section: &JiraSection, fetcher: HttpFetcher) -> Option<Self> {
        let url = section.url.as_deref()?;
        let token = section.auth_token.as_deref()?;
        Some(
            Self::new(url, token, section.username.clone(), fetcher)
                .with_page_size(section.page_size),
        )
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetch up to `max_results` issues matching `jql`, page by page.
    pub async fn search(&self, jql: &str, max_results: usize) -> Result<Vec<Issue>, FetchError> {
        let url = format!("{}/rest/api/2/search", self.base_url);
        let mut issues = Vec::new();
        let mut start_at = 0usize;

        while issues.len() < max_results {
            let page_size = self.page_size.min(max_results - issues.len());
            debug!(jql, start_at, page_size, "Requesting Jira search page");

            let page: SearchPage = self
                .fetcher
                .get_json("jira_search", |client| {
                    let request = client
                        .get(&url)
                        .header("Accept", "application/json")
                        .query(&[
                            ("jql", jql.to_string()),
                            ("startAt", start_at.to_string()),
                            ("maxResults", page_size.to_string()),
                            ("fields", SEARCH_FIELDS.to_string()),
                        ]);
                    match &self.username {
                        Some(user) => request.basic_auth(user, Some(&self.token)),
                        None => request.header("Authorization", format!("Basic {}", self.token)),
                    }
                })
                .await?;

            let returned = page.issues.len();
            issues.extend(page.issues.into_iter().map(RawIssue::into_issue));

            let advanced = page.max_results.unwrap_or(page_size);
            let next = start_at + advanced;
            if advanced == 0 || returned == 0 || next >= page.total {
                break;
            }
            start_at = next;
        }

        issues.truncate(max_results);
        info!(jql, count = issues.len(), "Fetched Jira issues");
        Ok(issues)
    }

    /// Every issue in `project_key`.
    pub async fn fetch_project_issues(&self, project_key: &str) -> Result<Vec<Issue>, FetchError> {
        self.search(&format!("project={project_key}"), usize::MAX).await
    }
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn fetch_issues(&self, jql: &str, max_results: usize) -> Result<Vec<Issue>, Error> {
        self.search(jql, max_results)
            .await
            .map_err(|e| Error::Tool(e.into_tool_error(FetchJiraTool::NAME)))
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    issues: Vec<RawIssue>,
    #[serde(default, rename = "maxResults")]
    max_results: Option<usize>,
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    #[serde(default)]
    fields: RawFields,
}

#[derive(Debug, Default, Deserialize)]
struct RawFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<RawStatus>,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    #[serde(default)]
    name: Option<String>,
}

impl RawIssue {
    fn into_issue(self) -> Issue {
        Issue {
            key: self.key,
            summary: self.fields.summary,
            description: self.fields.description,
            status: self.fields.status.and_then(|s| s.name),
            labels: self.fields.labels,
        }
    }
}

/// `fetch_jira(jql, max_results = 50)`: search the issue tracker.
pub struct FetchJiraTool {
    client: Option<Arc<JiraClient>>,
}

impl FetchJiraTool {
    pub const NAME: &'static str = "fetch_jira";

    /// `None` registers the tool anyway; calls then fail as not configured.
    pub fn new(client: Option<Arc<JiraClient>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FetchJiraTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Search Jira with a JQL query and return matching issues with key, \
         summary, description, status and labels."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("jql", ParamType::String, "JQL query, e.g. project=PRJ")
            .optional(
                "max_results",
                ParamType::Integer,
                "Maximum number of issues to return (default 50)",
            )
    }

    async fn execute(&self, arguments: ToolArgs) -> Result<serde_json::Value, ToolError> {
        let client = self.client.as_ref().ok_or_else(|| {
            ToolError::NotConfigured(format!(
                "{}: JIRA_URL and JIRA_AUTH_TOKEN must be set",
                Self::NAME
            ))
        })?;
        let jql = arguments.str("jql")?;
        let max_results = arguments.u64_or("max_results", 50)? as usize;

        let issues = client
            .search(jql, max_results)
            .await
            .map_err(|e| e.into_tool_error(Self::NAME))?;
        serde_json::to_value(issues).map_err(|e| ToolError::ExecutionFailed {
            tool_name: Self::NAME.into(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideaforge_core::retry::RetryPolicy;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5), RetryPolicy::immediate(2)).unwrap()
    }

    fn issue(key: &str, summary: &str, status: &str) -> serde_json::Value {
        json!({
            "key": key,
            "fields": {
                "summary": summary,
                "description": null,
                "status": {"name": status},
                "labels": ["l1"]
            }
        })
    }

    #[tokio::test]
    async fn paginates_until_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "0"))
            .and(query_param("maxResults", "2"))
            .and(query_param("jql", "project=PRJ"))
            .and(query_param("fields", SEARCH_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [issue("PRJ-1", "S1", "Todo"), issue("PRJ-2", "S2", "Doing")],
                "startAt": 0, "maxResults": 2, "total": 3
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [issue("PRJ-3", "S3", "Done")],
                "startAt": 2, "maxResults": 2, "total": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri(), "tok", None, fetcher()).with_page_size(2);
        let issues = client.fetch_project_issues("PRJ").await.unwrap();

        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].key, "PRJ-1");
        assert_eq!(issues[1].summary.as_deref(), Some("S2"));
        assert_eq!(issues[2].status.as_deref(), Some("Done"));
        assert_eq!(issues[0].labels, vec!["l1"]);
        assert!(issues[0].description.is_none());
    }

    #[tokio::test]
    async fn token_only_auth_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "Basic tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [], "startAt": 0, "maxResults": 50, "total": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri(), "tok", None, fetcher());
        assert!(client.search("project=PRJ", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn username_uses_basic_auth() {
        let server = MockServer::start().await;
        // base64("alice:tok")
        Mock::given(method("GET"))
            .and(header("Authorization", "Basic YWxpY2U6dG9r"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [issue("PRJ-1", "S1", "Todo")], "startAt": 0, "maxResults": 50, "total": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri(), "tok", Some("alice".into()), fetcher());
        assert_eq!(client.search("project=PRJ", 50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn result_cap_limits_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("maxResults", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [issue("PRJ-1", "S1", "Todo")],
                "startAt": 0, "maxResults": 1, "total": 10
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri(), "tok", None, fetcher());
        assert_eq!(client.search("project=PRJ", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn server_error_surfaces_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri(), "tok", None, fetcher());
        let err = client.fetch_issues("project=PRJ", 5).await.unwrap_err();
        assert!(err.to_string().contains("fetch_jira"));
    }

    #[test]
    fn from_config_requires_url_and_token() {
        let mut section = JiraSection::default();
        assert!(JiraClient::from_config(&section, fetcher()).is_none());
        section.url = Some("https://jira.example.com/".into());
        section.auth_token = Some("tok".into());
        let client = JiraClient::from_config(&section, fetcher()).unwrap();
        assert_eq!(client.base_url, "https://jira.example.com");
    }

    #[tokio::test]
    async fn unconfigured_tool_fails_cleanly() {
        let tool = FetchJiraTool::new(None);
        let args = tool
            .parameters()
            .validate(FetchJiraTool::NAME, json!({"jql": "project=PRJ"}))
            .unwrap();
        let err = tool.execute(args).await.unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured(_)));
    }

    #[test]
    fn max_results_must_be_integer() {
        let tool = FetchJiraTool::new(None);
        let err = tool
            .parameters()
            .validate(FetchJiraTool::NAME, json!({"jql": "x", "max_results": "ten"}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
