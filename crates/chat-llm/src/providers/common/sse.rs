//! Shared SSE -> [`TextStream`] adapter.

use eventsource_stream::Eventsource;
use futures_util::future;
use futures_util::StreamExt;
use reqwest::Response;

use crate::provider::{LLMError, Result, TextStream};
use crate::types::LLMChunk;

fn to_stream_error(err: LLMError) -> LLMError {
    match err {
        LLMError::Stream(msg) => LLMError::Stream(msg),
        other => LLMError::Stream(other.to_string()),
    }
}

/// Convert an SSE HTTP [`Response`] into a [`TextStream`].
///
/// `handler` receives the SSE event name and data payload for each event, and can either:
/// - return `Ok(Some(LLMChunk::Token(text)))` to emit a chunk
/// - return `Ok(Some(LLMChunk::Done))` to end the stream; later events are ignored
/// - return `Ok(None)` to skip an event
/// - return `Err(_)` to emit a stream error (mapped to `LLMError::Stream`)
pub fn text_stream_from_sse<H>(response: Response, mut handler: H) -> TextStream
where
    H: FnMut(&str, &str) -> Result<Option<LLMChunk>> + Send + 'static,
{
    let stream = response
        .bytes_stream()
        .eventsource()
        .map(move |event| {
            let event = event.map_err(|e| LLMError::Stream(e.to_string()))?;
            handler(event.event.as_str(), event.data.as_str()).map_err(to_stream_error)
        })
        .take_while(|result| future::ready(!matches!(result, Ok(Some(LLMChunk::Done)))))
        .filter_map(|result| async move {
            match result {
                Ok(Some(LLMChunk::Token(text))) => Some(Ok(text)),
                Ok(Some(LLMChunk::Done)) | Ok(None) => None,
                Err(err) => Some(Err(err)),
            }
        });

    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn network_tests_disabled() -> bool {
        std::env::var_os("BRANCH_CHAT_NETWORK_TESTS_DISABLED").is_some()
    }

    async fn serve(body: &'static str) -> Response {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&mock_server)
            .await;

        reqwest::Client::new()
            .get(format!("{}/sse", mock_server.uri()))
            .send()
            .await
            .expect("response")
    }

    #[tokio::test]
    async fn skipped_events_are_filtered_out() {
        if network_tests_disabled() {
            return;
        }

        let response = serve(concat!(
            "data: Hel\n\n",
            "event: ping\n",
            "data: ignored\n\n",
            "data: lo\n\n",
            "data: [DONE]\n\n",
        ))
        .await;

        let stream = text_stream_from_sse(response, |event, data| {
            if event == "ping" || data == "[DONE]" {
                return Ok(None);
            }
            Ok(Some(LLMChunk::Token(data.to_string())))
        });

        let out: Vec<String> = stream.map(|item| item.expect("chunk")).collect().await;
        assert_eq!(out, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn done_ends_the_stream() {
        if network_tests_disabled() {
            return;
        }

        let response = serve(concat!(
            "data: first\n\n",
            "data: [DONE]\n\n",
            "data: late\n\n",
        ))
        .await;

        let stream = text_stream_from_sse(response, |_event, data| {
            if data == "[DONE]" {
                return Ok(Some(LLMChunk::Done));
            }
            Ok(Some(LLMChunk::Token(data.to_string())))
        });

        let out: Vec<String> = stream.map(|item| item.expect("chunk")).collect().await;
        assert_eq!(out, vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn handler_errors_become_stream_errors() {
        if network_tests_disabled() {
            return;
        }

        let response = serve("data: boom\n\n").await;
        let mut stream =
            text_stream_from_sse(response, |_event, _data| Err(LLMError::Api("boom".to_string())));

        match stream.next().await {
            Some(Err(LLMError::Stream(msg))) => assert!(msg.contains("API error")),
            other => panic!("expected LLMError::Stream, got: {other:?}"),
        }
    }
}
