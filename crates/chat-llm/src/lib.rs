//! chat-llm - Streaming completion providers
//!
//! All providers implement [`CompletionProvider`] and yield plain text
//! chunks, so callers never see wire formats.

pub mod provider;
pub mod provider_factory;
pub mod providers;
pub mod types;

pub use provider::{CompletionProvider, LLMError, Result, TextStream};
pub use provider_factory::{create_provider, ProviderOptions};
pub use providers::{GatewayProvider, MockProvider, OpenAIProvider};
pub use types::{ApiProvider, CompletionRequest, LLMChunk};
