//! Roadmap documentation crawler and the `fetch_roadmap` tool.
//!
//! Crawls every page on the root's host whose URL starts with the root URL,
//! up to a page budget. Text extraction is deliberately shallow: scripts and
//! styles are dropped, tags stripped, common entities decoded.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use ideaforge_core::error::{Error, ToolError};
use ideaforge_core::records::{Document, DocumentSource};
use ideaforge_core::tool::{ParamType, ParameterSchema, Tool, ToolArgs};
use regex_lite::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::http::{FetchError, HttpFetcher};

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Compiled patterns for the shallow HTML scraping the crawler needs.
pub struct HtmlScraper {
    script_style: Regex,
    tag: Regex,
    title: Regex,
    href: Regex,
}

impl HtmlScraper {
    pub fn new() -> Result<Self, regex_lite::Error> {
        Ok(Self {
            script_style: Regex::new(
                r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->",
            )?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
            title: Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>")?,
            href: Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["']"#)?,
        })
    }

    /// Visible text of an HTML page, one non-empty trimmed line per block.
    pub fn text(&self, html: &str) -> String {
        let without_code = self.script_style.replace_all(html, "");
        let stripped = self.tag.replace_all(&without_code, "\n");
        decode_entities(&stripped)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Contents of `<title>`, if present and non-empty.
    pub fn title(&self, html: &str) -> Option<String> {
        self.title
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| decode_entities(m.as_str()).trim().to_string())
            .filter(|t| !t.is_empty())
    }

    fn links<'h>(&self, html: &'h str) -> Vec<&'h str> {
        self.href
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|href| !href.is_empty())
            .collect()
    }
}

/// Canonical form used for the visited set: no fragment, no trailing slash.
fn normalize(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.as_str().trim_end_matches('/').to_string()
}

/// Crawls a documentation site into [`Document`]s.
pub struct DocumentRetriever {
    fetcher: HttpFetcher,
    scraper: HtmlScraper,
    max_pages: usize,
}

impl DocumentRetriever {
    pub fn new(fetcher: HttpFetcher, max_pages: usize) -> Result<Self, FetchError> {
        let scraper = HtmlScraper::new().map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self {
            fetcher,
            scraper,
            max_pages: max_pages.max(1),
        })
    }

    /// Crawl from `root_url`. A failure on the root page is returned; failures
    /// on any other page are logged and skipped.
    pub async fn crawl(&self, root_url: &str) -> Result<Vec<Document>, FetchError> {
        let root = Url::parse(root_url.trim())
            .map_err(|e| FetchError::Request(format!("invalid root URL '{root_url}': {e}")))?;
        let prefix = normalize(&root);
        let host = root.host_str().map(str::to_string);
        let port = root.port_or_known_default();

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::from([prefix.clone()]);
        let mut documents = Vec::new();

        while let Some(url) = queue.pop_front() {
            if visited.len() >= self.max_pages {
                debug!(max_pages = self.max_pages, pending = queue.len() + 1, "Page budget reached");
                break;
            }
            if !visited.insert(url.clone()) {
                continue;
            }

            let html = match self.fetcher.get_text(&url).await {
                Ok(html) => html,
                Err(e) if url == prefix => return Err(e),
                Err(e) => {
                    warn!(url = %url, error = %e, "Skipping page");
                    continue;
                }
            };

            let Ok(base) = Url::parse(&url) else {
                continue;
            };
            for href in self.scraper.links(&html) {
                let Ok(link) = base.join(href) else {
                    continue;
                };
                if link.host_str().map(str::to_string) != host || link.port_or_known_default() != port {
                    continue;
                }
                let link = normalize(&link);
                if link.starts_with(&prefix) && !visited.contains(&link) {
                    queue.push_back(link);
                }
            }

            documents.push(Document {
                title: self.scraper.title(&html).unwrap_or_else(|| url.clone()),
                content: self.scraper.text(&html),
                url,
            });
        }

        info!(root = %prefix, pages = documents.len(), "Crawled roadmap documentation");
        Ok(documents)
    }
}

#[async_trait]
impl DocumentSource for DocumentRetriever {
    async fn fetch_documents(&self, root_url: &str) -> Result<Vec<Document>, Error> {
        self.crawl(root_url)
            .await
            .map_err(|e| Error::Tool(e.into_tool_error(FetchRoadmapTool::NAME)))
    }
}

/// `fetch_roadmap(roadmap_url)`: crawl product documentation.
pub struct FetchRoadmapTool {
    retriever: Arc<DocumentRetriever>,
}

impl FetchRoadmapTool {
    pub const NAME: &'static str = "fetch_roadmap";

    pub fn new(retriever: Arc<DocumentRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for FetchRoadmapTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Crawl the product roadmap documentation starting at a URL and return \
         each page's title, URL and text content."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required(
            "roadmap_url",
            ParamType::String,
            "Root URL of the roadmap documentation",
        )
    }

    async fn execute(&self, arguments: ToolArgs) -> Result<serde_json::Value, ToolError> {
        let url = arguments.str("roadmap_url")?;
        let documents = self
            .retriever
            .crawl(url)
            .await
            .map_err(|e| e.into_tool_error(Self::NAME))?;
        serde_json::to_value(documents).map_err(|e| ToolError::ExecutionFailed {
            tool_name: Self::NAME.into(),
            reason: e.to_string(),
        })
    }
}
