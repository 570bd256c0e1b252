//! LLM Provider implementations for IdeaForge.
//!
//! All providers implement the `ideaforge_core::Provider` trait.
//! [`build_from_config`] assembles the chat backend the CLI uses: the
//! OpenAI-compatible adapter wrapped in the retry decorator.

pub mod openai_compat;
pub mod retry;

use std::sync::Arc;

use ideaforge_config::AppConfig;
use ideaforge_core::error::ProviderError;
use ideaforge_core::Provider;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryProvider;

/// Build the retrying chat provider from configuration.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY is not set".into()))?;

    let base = OpenAiCompatProvider::new(
        "openai",
        &config.api_base_url,
        api_key,
        config.http.timeout(),
    )?;

    tracing::debug!(
        base_url = %config.api_base_url,
        model = %config.model,
        max_attempts = config.retry.max_attempts,
        "Chat provider configured"
    );

    Ok(Arc::new(RetryProvider::with_policy(
        Arc::new(base),
        config.retry.to_policy(),
    )))
}
