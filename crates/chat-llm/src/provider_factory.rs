//! Provider Factory
//!
//! Creates completion providers for the configured [`ApiProvider`].

use std::sync::Arc;

use crate::provider::CompletionProvider;
use crate::providers::gateway::DEFAULT_GATEWAY_URL;
use crate::providers::openai::DEFAULT_OPENAI_BASE_URL;
use crate::providers::{GatewayProvider, MockProvider, OpenAIProvider};
use crate::types::ApiProvider;

/// Endpoints used when building providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOptions {
    pub gateway_url: String,
    pub openai_base_url: String,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

impl ProviderOptions {
    /// Defaults overridden by `BRANCH_CHAT_GATEWAY_URL` and
    /// `BRANCH_CHAT_OPENAI_BASE_URL`.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(url) = non_empty_env("BRANCH_CHAT_GATEWAY_URL") {
            options.gateway_url = url;
        }
        if let Some(url) = non_empty_env("BRANCH_CHAT_OPENAI_BASE_URL") {
            options.openai_base_url = url;
        }
        options
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Create the provider for `provider`.
pub fn create_provider(
    provider: ApiProvider,
    options: &ProviderOptions,
) -> Arc<dyn CompletionProvider> {
    log::debug!("Creating {} completion provider", provider.as_str());
    match provider {
        ApiProvider::Gateway => {
            Arc::new(GatewayProvider::new().with_base_url(options.gateway_url.as_str()))
        }
        ApiProvider::OpenAi => {
            Arc::new(OpenAIProvider::new().with_base_url(options.openai_base_url.as_str()))
        }
        ApiProvider::Mock => Arc::new(MockProvider::new()),
    }
}
