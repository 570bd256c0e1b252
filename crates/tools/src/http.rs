//! Shared HTTP GET client with bounded retry.
//!
//! The crawler and the issue-tracker client both go through [`HttpFetcher`],
//! so every outbound GET gets the same timeout and the same backoff policy
//! as the chat provider.

use std::time::Duration;

use ideaforge_core::error::ToolError;
use ideaforge_core::retry::{RetryError, RetryPolicy, Retryable};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    Request(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Gave up after {attempts} attempts: {last}")]
    Unavailable { attempts: u32, last: Box<FetchError> },
}

impl Retryable for FetchError {
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Timeout(_) | FetchError::Network(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            FetchError::Request(e.to_string())
        } else if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

impl FetchError {
    /// Surface this failure as the named tool's execution error.
    pub fn into_tool_error(self, tool: &str) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: tool.to_string(),
            reason: self.to_string(),
        }
    }
}

/// GET-only HTTP client with a fixed timeout and retry policy.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ideaforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { client, retry })
    }

    /// Build from an existing client (e.g. in tests).
    pub fn from_client(client: reqwest::Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// GET `url` and return the body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.send(url, |client| client.get(url)).await
    }

    /// Send a customised GET (headers, query, auth) and decode the JSON body.
    pub async fn get_json<T, F>(&self, label: &str, build: F) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let body = self.send(label, build).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn send<F>(&self, label: &str, build: F) -> Result<String, FetchError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let result = self
            .retry
            .run(label, |attempt| {
                let request = build(&self.client);
                async move {
                    debug!(attempt, "GET");
                    let response = request.send().await?;
                    let status = response.status().as_u16();
                    let body = response.text().await?;
                    if (200..300).contains(&status) {
                        Ok(body)
                    } else {
                        Err(FetchError::Status { status, body })
                    }
                }
            })
            .await;

        result.map_err(|e| match e {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted { attempts, last } => FetchError::Unavailable {
                attempts,
                last: Box::new(last),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(attempts: u32) -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5), RetryPolicy::immediate(attempts)).unwrap()
    }

    #[test]
    fn transient_classification() {
        assert!(FetchError::Status { status: 503, body: String::new() }.is_transient());
        assert!(FetchError::Status { status: 429, body: String::new() }.is_transient());
        assert!(!FetchError::Status { status: 404, body: String::new() }.is_transient());
        assert!(FetchError::Timeout("30s".into()).is_transient());
        assert!(FetchError::Network("reset".into()).is_transient());
        assert!(!FetchError::Decode("eof".into()).is_transient());
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = fetcher(3)
            .get_text(&format!("{}/flaky", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unavailable { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn client_errors_fail_fast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher(4)
            .get_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"total": 2})))
            .mount(&server)
            .await;

        let url = format!("{}/data", server.uri());
        let value: serde_json::Value = fetcher(1)
            .get_json("data", |client| client.get(&url))
            .await
            .unwrap();
        assert_eq!(value["total"], 2);
    }
}
