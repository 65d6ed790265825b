//! Completion providers
//!
//! Hosted gateway, direct OpenAI-compatible access, and an offline mock.

pub(crate) mod common;
pub mod gateway;
pub mod mock;
pub mod openai;

pub use gateway::GatewayProvider;
pub use mock::MockProvider;
pub use openai::OpenAIProvider;
