use chat_tree::ChatMessage;
use serde::{Deserialize, Serialize};

/// Which completion backend serves requests.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    /// Hosted gateway; the model string is passed through unchanged.
    #[default]
    Gateway,
    /// Direct calls with a user-supplied key.
    OpenAi,
    /// Offline filler text, no network or credentials.
    Mock,
}

impl ApiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gateway" => Some(Self::Gateway),
            "openai" => Some(Self::OpenAi),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

/// A single completion call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Model context, oldest first
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub provider: ApiProvider,
    /// Sent out-of-band (header), never in the body
    pub api_key: Option<String>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, model: impl Into<String>, provider: ApiProvider) -> Self {
        Self {
            messages,
            model: model.into(),
            provider,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }
}

/// A parsed streaming delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LLMChunk {
    Token(String),
    Done,
}
