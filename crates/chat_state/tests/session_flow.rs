use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chat_llm::{
    ApiProvider, CompletionProvider, CompletionRequest, LLMError, MockProvider, TextStream,
};
use chat_state::session::error_response;
use chat_state::{
    Action, ActiveView, AppState, ChatSession, MemoryKeyValueStore, SendOutcome, SettingsPatch,
    Store,
};
use chat_tree::{ChatMessage, NodeSource};
use futures::stream;
use futures::StreamExt;
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Replays a fixed list of chunks and records every request it receives.
#[derive(Default)]
struct ScriptedProvider {
    chunks: Vec<Result<String, String>>,
    hang_after: bool,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn new(chunks: &[Result<&str, &str>]) -> Self {
        Self {
            chunks: chunks
                .iter()
                .copied()
                .map(|c| c.map(str::to_string).map_err(str::to_string))
                .collect(),
            ..Self::default()
        }
    }

    fn hanging(mut self) -> Self {
        self.hang_after = true;
        self
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn stream_completion(&self, request: &CompletionRequest) -> chat_llm::Result<TextStream> {
        self.requests.lock().unwrap().push(request.clone());

        let items: Vec<chat_llm::Result<String>> = self
            .chunks
            .iter()
            .map(|c| c.clone().map_err(LLMError::Stream))
            .collect();
        let scripted = stream::iter(items);

        if self.hang_after {
            Ok(Box::pin(scripted.chain(stream::pending())))
        } else {
            Ok(Box::pin(scripted))
        }
    }
}

struct RefusingProvider;

#[async_trait]
impl CompletionProvider for RefusingProvider {
    async fn stream_completion(&self, _request: &CompletionRequest) -> chat_llm::Result<TextStream> {
        Err(LLMError::Api("HTTP 500: upstream exploded".to_string()))
    }
}

fn imported_store() -> Store {
    let mut store = Store::with_state(AppState::default(), Box::new(MemoryKeyValueStore::new()));
    store
        .import_json(&json!({
            "metadata": { "title": "Flow" },
            "messages": [
                { "role": "Prompt", "say": "x" },
                { "role": "Response", "say": "y" },
                { "role": "Prompt", "say": "a" },
                { "role": "Response", "say": "b" }
            ]
        }))
        .expect("import");
    store
}

fn node_response(session: &ChatSession, node_id: &str) -> String {
    session.store().state().tree.as_ref().unwrap().get(node_id).unwrap().response.clone()
}

#[tokio::test]
async fn branch_then_send_commits_streamed_response() {
    let provider = Arc::new(ScriptedProvider::new(&[Ok("Hel"), Ok("lo"), Ok("!")]));
    let mut session = ChatSession::new(imported_store()).with_provider(provider.clone());

    session.store_mut().dispatch(Action::UpdateSettings(SettingsPatch {
        model: Some("openai/gpt-4o".to_string()),
        api_key: Some(Some("sk-user".to_string())),
        ..SettingsPatch::default()
    }));

    let transition = session
        .store_mut()
        .dispatch(Action::BranchFromNode("node-0".to_string()));
    assert!(transition.changed);

    let state = session.store().state();
    assert_eq!(state.active_view, ActiveView::Path);
    let branch_id = state.selected_node_id.clone().unwrap();
    assert_eq!(
        state.tree.as_ref().unwrap().sibling_position(&branch_id),
        Some((2, 2))
    );

    let mut partials = Vec::new();
    let outcome = session
        .send_prompt(&branch_id, "q", &CancellationToken::new(), |pending| {
            partials.push(pending.text.clone());
            assert_eq!(pending.node_id, branch_id);
        })
        .await;

    assert_eq!(outcome, SendOutcome::Completed);
    assert_eq!(partials, vec!["Hel", "Hello", "Hello!"]);
    assert_eq!(node_response(&session, &branch_id), "Hello!");

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].messages,
        vec![
            ChatMessage::user("x"),
            ChatMessage::assistant("y"),
            ChatMessage::user("q"),
        ]
    );
    assert_eq!(requests[0].model, "openai/gpt-4o");
    assert_eq!(requests[0].provider, ApiProvider::Gateway);
    assert_eq!(requests[0].api_key.as_deref(), Some("sk-user"));

    let tree = session.store().state().tree.clone().unwrap();
    assert_eq!(tree.get(&branch_id).unwrap().source, NodeSource::Generated);
    assert!(tree.validate().is_ok());
}

#[tokio::test]
async fn provider_error_is_written_into_response() {
    let mut session = ChatSession::new(imported_store()).with_provider(Arc::new(RefusingProvider));

    let outcome = session
        .send_prompt("node-1", "retry", &CancellationToken::new(), |_| {})
        .await;

    let SendOutcome::Failed(message) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(message.contains("upstream exploded"));
    assert_eq!(node_response(&session, "node-1"), error_response(&message));
}

#[tokio::test]
async fn mid_stream_error_replaces_partial_text() {
    let provider = ScriptedProvider::new(&[Ok("partial"), Err("connection reset")]);
    let mut session = ChatSession::new(imported_store()).with_provider(Arc::new(provider));

    let outcome = session
        .send_prompt("node-1", "retry", &CancellationToken::new(), |_| {})
        .await;

    assert!(matches!(outcome, SendOutcome::Failed(ref m) if m.contains("connection reset")));
    let response = node_response(&session, "node-1");
    assert!(response.starts_with("Error: "));
    assert!(!response.contains("partial"));
    assert_eq!(
        session.store().state().tree.as_ref().unwrap().get("node-1").unwrap().prompt,
        "retry"
    );
}

#[tokio::test]
async fn cancelling_mid_stream_keeps_committed_exchange() {
    let provider = ScriptedProvider::new(&[Ok("first")]).hanging();
    let mut session = ChatSession::new(imported_store()).with_provider(Arc::new(provider));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let outcome = session
        .send_prompt("node-1", "retry", &cancel, |pending| {
            assert_eq!(pending.text, "first");
            trigger.cancel();
        })
        .await;

    assert_eq!(outcome, SendOutcome::Cancelled);
    let node = session.store().state().tree.as_ref().unwrap().get("node-1").unwrap().clone();
    assert_eq!(node.prompt, "a");
    assert_eq!(node.response, "b");
}

#[tokio::test]
async fn resend_replaces_stale_exchange_in_context() {
    let provider = Arc::new(ScriptedProvider::new(&[Ok("fresh")]));
    let mut session = ChatSession::new(imported_store()).with_provider(provider.clone());

    let outcome = session
        .send_prompt("node-1", "retry", &CancellationToken::new(), |_| {})
        .await;
    assert_eq!(outcome, SendOutcome::Completed);

    assert_eq!(
        provider.requests()[0].messages,
        vec![
            ChatMessage::user("x"),
            ChatMessage::assistant("y"),
            ChatMessage::user("retry"),
        ]
    );
    let node = session.store().state().tree.as_ref().unwrap().get("node-1").unwrap().clone();
    assert_eq!(node.prompt, "retry");
    assert_eq!(node.response, "fresh");
}

#[tokio::test]
async fn mock_provider_is_selected_from_settings() {
    let mut session = ChatSession::new(imported_store());
    session.store_mut().dispatch(Action::UpdateSettings(SettingsPatch {
        api_provider: Some(ApiProvider::Mock),
        ..SettingsPatch::default()
    }));

    let outcome = session
        .send_prompt("node-1", "anything", &CancellationToken::new(), |_| {})
        .await;

    assert_eq!(outcome, SendOutcome::Completed);
    assert!(!node_response(&session, "node-1").is_empty());
}

#[tokio::test]
async fn seeded_mock_streams_deterministically() {
    let run = || async {
        let provider = MockProvider::new().with_delay_ms(0..=0).with_seed(99);
        let mut session = ChatSession::new(imported_store()).with_provider(Arc::new(provider));
        session
            .send_prompt("node-0", "go", &CancellationToken::new(), |_| {})
            .await;
        node_response(&session, "node-0")
    };

    assert_eq!(run().await, run().await);
}
