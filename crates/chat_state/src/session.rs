//! Chat session - sends a prompt from a node and streams the reply back.
//!
//! Streaming is a two-phase write: chunks accumulate in a transient
//! [`PendingResponse`] that the caller can render, and the node's prompt and
//! response are written together exactly once when the stream ends or fails.
//! A cancelled send drops the stream (aborting the HTTP request), discards the
//! buffer and leaves the node as it was.

use std::sync::Arc;

use chat_llm::{create_provider, CompletionProvider, CompletionRequest, ProviderOptions, TextStream};
use chat_tree::{ChatMessage, NodeId, NodePatch, TreeError};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::machine::{Action, Store};

/// Response text received so far for an in-flight send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingResponse {
    pub node_id: NodeId,
    pub text: String,
}

impl PendingResponse {
    fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            text: String::new(),
        }
    }
}

/// How a send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Full response committed to the node.
    Completed,
    /// Error text committed to the node.
    Failed(String),
    /// Abandoned before completion; nothing committed.
    Cancelled,
    /// No tree, or the node is not in it.
    NodeNotFound,
}

enum StreamEnd {
    Finished,
    Failed(String),
    Cancelled,
}

/// Format of the response written when a completion fails.
pub fn error_response(message: &str) -> String {
    format!("Error: {message}")
}

pub struct ChatSession {
    store: Store,
    options: ProviderOptions,
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl ChatSession {
    /// Session that picks its provider from the current settings.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            options: ProviderOptions::from_env(),
            provider: None,
        }
    }

    /// Always use `provider`, whatever the settings say.
    pub fn with_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    fn provider(&self) -> Arc<dyn CompletionProvider> {
        match &self.provider {
            Some(provider) => Arc::clone(provider),
            None => create_provider(self.store.state().settings.api_provider, &self.options),
        }
    }

    /// Stream a completion for `prompt` sent from `node_id`, then commit the
    /// prompt and response to the node. `on_chunk` sees the accumulated text
    /// after every chunk.
    pub async fn send_prompt<F>(
        &mut self,
        node_id: &str,
        prompt: &str,
        cancel: &CancellationToken,
        mut on_chunk: F,
    ) -> SendOutcome
    where
        F: FnMut(&PendingResponse),
    {
        let history = match self.request_history(node_id, prompt) {
            Some(Ok(history)) => history,
            Some(Err(err)) => {
                tracing::error!("Cannot build history for {}: {}", node_id, err);
                return self.commit(node_id, prompt, Err(err.to_string()));
            }
            None => {
                tracing::warn!("Cannot send from unknown node {}", node_id);
                return SendOutcome::NodeNotFound;
            }
        };

        let settings = &self.store.state().settings;
        let request = CompletionRequest::new(history, settings.model.clone(), settings.api_provider)
            .with_api_key(settings.api_key.clone());

        tracing::info!(
            "Sending {} messages from node {} via {}",
            request.messages.len(),
            node_id,
            request.provider.as_str()
        );

        let provider = self.provider();
        let mut pending = PendingResponse::new(node_id);
        let end = tokio::select! {
            biased;
            _ = cancel.cancelled() => StreamEnd::Cancelled,
            result = provider.stream_completion(&request) => match result {
                Ok(stream) => consume(stream, &mut pending, cancel, &mut on_chunk).await,
                Err(err) => StreamEnd::Failed(err.to_string()),
            },
        };

        match end {
            StreamEnd::Finished => self.commit(node_id, prompt, Ok(pending.text)),
            StreamEnd::Failed(message) => {
                tracing::warn!("Completion for {} failed: {}", node_id, message);
                self.commit(node_id, prompt, Err(message))
            }
            StreamEnd::Cancelled => {
                tracing::info!(
                    "Completion for {} cancelled after {} bytes",
                    node_id,
                    pending.text.len()
                );
                SendOutcome::Cancelled
            }
        }
    }

    /// Model context for sending `prompt` from `node_id`: the parent's
    /// history followed by the new prompt. The node's current response is
    /// left out. `None` when the node is unknown.
    fn request_history(
        &self,
        node_id: &str,
        prompt: &str,
    ) -> Option<Result<Vec<ChatMessage>, TreeError>> {
        let node = self.store.state().tree.as_ref()?.get(node_id)?;
        let history = match &node.parent_id {
            Some(parent_id) => self.store.state().chat_history(parent_id),
            None => Ok(Vec::new()),
        };
        Some(history.map(|mut history| {
            if !prompt.is_empty() {
                history.push(ChatMessage::user(prompt));
            }
            history
        }))
    }

    /// Write prompt and final response to the node in one update.
    fn commit(&mut self, node_id: &str, prompt: &str, result: Result<String, String>) -> SendOutcome {
        let (response, outcome) = match result {
            Ok(text) => (text, SendOutcome::Completed),
            Err(message) => (error_response(&message), SendOutcome::Failed(message)),
        };
        self.store.dispatch(Action::UpdateNode {
            node_id: node_id.to_string(),
            patch: NodePatch::prompt(prompt).with_response(response),
        });
        outcome
    }
}

async fn consume<F>(
    mut stream: TextStream,
    pending: &mut PendingResponse,
    cancel: &CancellationToken,
    on_chunk: &mut F,
) -> StreamEnd
where
    F: FnMut(&PendingResponse),
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return StreamEnd::Cancelled,
            next = stream.next() => match next {
                Some(Ok(chunk)) => {
                    pending.text.push_str(&chunk);
                    on_chunk(pending);
                }
                Some(Err(err)) => return StreamEnd::Failed(err.to_string()),
                None => return StreamEnd::Finished,
            },
        }
    }
}
