//! Provider retry: bounded backoff around a single rate-limited backend.
//!
//! Wraps any provider with a [`RetryPolicy`]. Transient failures (timeouts,
//! connection errors, 5xx, rate limits) are retried with randomized
//! exponential backoff; anything else propagates on the attempt it occurred.
//! Exhaustion is reported as [`ProviderError::Unavailable`].

use async_trait::async_trait;
use ideaforge_core::error::ProviderError;
use ideaforge_core::provider::*;
use ideaforge_core::retry::{RetryError, RetryPolicy};
use std::sync::Arc;
use tracing::warn;

/// A provider that retries its inner provider on transient failure.
pub struct RetryProvider {
    name: String,
    inner: Arc<dyn ideaforge_core::Provider>,
    policy: RetryPolicy,
}

impl RetryProvider {
    /// Wrap `inner` with the default policy (4 attempts, 1s to 10s waits).
    pub fn new(inner: Arc<dyn ideaforge_core::Provider>) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: Arc<dyn ideaforge_core::Provider>, policy: RetryPolicy) -> Self {
        Self {
            name: format!("{}+retry", inner.name()),
            inner,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl ideaforge_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let inner = &self.inner;
        let result = self
            .policy
            .run(inner.name(), |attempt| {
                let request = request.clone();
                async move {
                    let result = inner.complete(request).await;
                    if let Err(ProviderError::RateLimited { retry_after_secs }) = &result {
                        warn!(
                            provider = %inner.name(),
                            attempt,
                            retry_after_secs,
                            "Rate limited; check that the API key has quota or billing credit"
                        );
                    }
                    result
                }
            })
            .await;

        result.map_err(|e| match e {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted { attempts, last } => ProviderError::Unavailable {
                attempts,
                last_error: Box::new(last),
            },
        })
    }
}
