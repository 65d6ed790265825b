use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::provider::{CompletionProvider, LLMError, Result, TextStream};
use crate::types::CompletionRequest;

use super::common::text_stream::text_stream_from_body;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";

/// Header carrying a user-supplied credential to the gateway.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Hosted gateway that streams the completion back as plain text.
pub struct GatewayProvider {
    client: Client,
    base_url: String,
}

impl GatewayProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_GATEWAY_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

impl Default for GatewayProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for GatewayProvider {
    async fn stream_completion(&self, request: &CompletionRequest) -> Result<TextStream> {
        let body = json!({
            "messages": request.messages,
            "model": request.model,
            "provider": request.provider,
        });

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(api_key) = &request.api_key {
            builder = builder.header(API_KEY_HEADER, api_key);
        }

        log::debug!(
            "Gateway request: {} messages, model '{}'",
            request.messages.len(),
            request.model
        );

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        Ok(text_stream_from_body(response))
    }
}
