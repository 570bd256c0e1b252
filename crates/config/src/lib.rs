//! Configuration loading, validation, and management for IdeaForge.
//!
//! Loads configuration from `./ideaforge.toml` (or an explicit path), then
//! applies environment variable overrides. A `.env` file in the working
//! directory is read first so its values count as environment.
//!
//! The config is built once in `main` and passed into constructors; nothing
//! else in the workspace reads the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ideaforge_core::RetryPolicy;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ideaforge.toml";

/// The root configuration structure.
///
/// Maps directly to `ideaforge.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat-completion API key (`OPENAI_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API (`OPENAI_BASE_URL`)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Model name (`LLM_MODEL`)
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for idea generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub http: HttpSection,

    #[serde(default)]
    pub roadmap: RoadmapSection,

    #[serde(default)]
    pub jira: JiraSection,

    #[serde(default)]
    pub output: OutputSection,
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("agent", &self.agent)
            .field("retry", &self.retry)
            .field("http", &self.http)
            .field("roadmap", &self.roadmap)
            .field("jira", &self.jira)
            .field("output", &self.output)
            .finish()
    }
}

/// What the agent loop does when a tool fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolErrorPolicy {
    /// Abort the run with the tool's error.
    #[default]
    Abort,
    /// Feed the error back to the model as the tool's result.
    Report,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Step ceiling: tool calls allowed before the run ends as exhausted
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    #[serde(default)]
    pub tool_errors: ToolErrorPolicy,
}

fn default_max_steps() -> u32 {
    5
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            tool_errors: ToolErrorPolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    4
}
fn default_min_delay_ms() -> u64 {
    1_000
}
fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetrySection {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    /// Per-request timeout for every outbound call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapSection {
    /// Root of the product documentation site (`ROADMAP_URL`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Upper bound on crawled pages
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_max_pages() -> usize {
    50
}

impl Default for RoadmapSection {
    fn default() -> Self {
        Self {
            url: None,
            max_pages: default_max_pages(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JiraSection {
    /// Jira base URL (`JIRA_URL`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Project whose issues feed the pipeline (`JIRA_PROJECT_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,

    /// API token (`JIRA_AUTH_TOKEN`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// When set, the token is sent as HTTP basic auth for this user (`JIRA_USERNAME`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Issues requested per search page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    50
}

impl Default for JiraSection {
    fn default() -> Self {
        Self {
            url: None,
            project_key: None,
            auth_token: None,
            username: None,
            page_size: default_page_size(),
        }
    }
}

impl std::fmt::Debug for JiraSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraSection")
            .field("url", &self.url)
            .field("project_key", &self.project_key)
            .field("auth_token", &redact(&self.auth_token))
            .field("username", &self.username)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Directory for ideas.md, ideas.json and feedback.json (`IDEAFORGE_OUTPUT_DIR`)
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// A group of settings a command cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Chat-completion credentials
    Llm,
    /// Documentation root
    Roadmap,
    /// Issue-tracker endpoint and token
    Jira,
    /// Issue-tracker project key
    JiraProject,
}

impl AppConfig {
    /// Load configuration from `path` (or `./ideaforge.toml`), then apply
    /// `.env` and process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let mut config = Self::load_from(path)?;

        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_file.display());
        }
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Overlay environment values. Empty values count as unset.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = get("LLM_MODEL") {
            self.model = v;
        }
        if let Some(v) = get("ROADMAP_URL") {
            self.roadmap.url = Some(v);
        }
        if let Some(v) = get("JIRA_URL") {
            self.jira.url = Some(v);
        }
        if let Some(v) = get("JIRA_PROJECT_KEY") {
            self.jira.project_key = Some(v);
        }
        if let Some(v) = get("JIRA_AUTH_TOKEN") {
            self.jira.auth_token = Some(v);
        }
        if let Some(v) = get("JIRA_USERNAME") {
            self.jira.username = Some(v);
        }
        if let Some(v) = get("IDEAFORGE_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(v);
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_steps must be at least 1".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry.min_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "http.timeout_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check that every key the given requirements need is set, reporting
    /// all missing keys at once.
    pub fn require(&self, requirements: &[Requirement]) -> Result<(), ConfigError> {
        let missing: Vec<String> = requirements
            .iter()
            .flat_map(|r| self.missing_for(*r))
            .map(String::from)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(missing))
        }
    }

    /// Environment keys a requirement still lacks.
    pub fn missing_for(&self, requirement: Requirement) -> Vec<&'static str> {
        let checks: &[(&'static str, bool)] = match requirement {
            Requirement::Llm => &[("OPENAI_API_KEY", self.openai_api_key.is_some())],
            Requirement::Roadmap => &[("ROADMAP_URL", self.roadmap.url.is_some())],
            Requirement::Jira => &[
                ("JIRA_URL", self.jira.url.is_some()),
                ("JIRA_AUTH_TOKEN", self.jira.auth_token.is_some()),
            ],
            Requirement::JiraProject => &[("JIRA_PROJECT_KEY", self.jira.project_key.is_some())],
        };
        checks
            .iter()
            .filter(|(_, present)| !present)
            .map(|(key, _)| *key)
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            api_base_url: default_api_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            agent: AgentSection::default(),
            retry: RetrySection::default(),
            http: HttpSection::default(),
            roadmap: RoadmapSection::default(),
            jira: JiraSection::default(),
            output: OutputSection::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

impl From<ConfigError> for ideaforge_core::Error {
    fn from(e: ConfigError) -> Self {
        ideaforge_core::Error::Config {
            message: e.to_string(),
        }
    }
}
