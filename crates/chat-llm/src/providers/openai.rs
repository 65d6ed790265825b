use async_trait::async_trait;
use reqwest::Client;

use crate::provider::{CompletionProvider, LLMError, Result, TextStream};
use crate::types::{CompletionRequest, LLMChunk};

use super::common::openai_compat::{
    build_openai_compat_body, parse_openai_compat_sse_data_strict,
};
use super::common::sse::text_stream_from_sse;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Prefix that namespaces direct-mode model ids, e.g. `openai/gpt-4o`.
pub const MODEL_PREFIX: &str = "openai/";

/// Strip the provider prefix from a model id.
pub fn direct_model_name(model: &str) -> &str {
    model.strip_prefix(MODEL_PREFIX).unwrap_or(model)
}

/// Direct-credential provider speaking the chat completions API.
pub struct OpenAIProvider {
    client: Client,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn stream_completion(&self, request: &CompletionRequest) -> Result<TextStream> {
        let api_key = request
            .api_key
            .as_deref()
            .ok_or_else(|| LLMError::Auth("OpenAI API key is required".to_string()))?;

        let model = direct_model_name(&request.model);
        log::debug!("OpenAI provider using model '{}'", model);

        let body = build_openai_compat_body(model, &request.messages);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        let stream = text_stream_from_sse(response, |_event, data| {
            if data.trim().is_empty() {
                return Ok(None);
            }

            match parse_openai_compat_sse_data_strict(data)? {
                LLMChunk::Token(text) if text.is_empty() => Ok(None),
                chunk => Ok(Some(chunk)),
            }
        });

        Ok(stream)
    }
}
