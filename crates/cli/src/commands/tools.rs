//! `ideaforge tools`: print the descriptors sent to the model.

use std::sync::Arc;

use ideaforge_config::AppConfig;
use ideaforge_core::Provider;
use ideaforge_providers::OpenAiCompatProvider;

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Only the descriptors are read, so a missing API key is fine here.
    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(
        "openai",
        &config.api_base_url,
        config.openai_api_key.clone().unwrap_or_default(),
        config.http.timeout(),
    )?);
    let registry = ideaforge_tools::default_registry(config, provider)?;

    println!("{}", serde_json::to_string_pretty(&registry.describe())?);
    Ok(())
}
