//! Raw text body -> [`TextStream`] adapter.
//!
//! The gateway streams plain UTF-8 text. Network chunks may split a
//! multi-byte character, so undecoded tail bytes are carried over to the
//! next chunk.

use futures_util::StreamExt;
use reqwest::Response;

use crate::provider::{LLMError, TextStream};

/// Decode the longest valid UTF-8 prefix of `buffer`, leaving an incomplete
/// trailing sequence in place. Invalid bytes are replaced.
pub fn drain_utf8(buffer: &mut Vec<u8>) -> String {
    match std::str::from_utf8(buffer) {
        Ok(text) => {
            let text = text.to_string();
            buffer.clear();
            text
        }
        Err(err) if err.error_len().is_none() => {
            let valid = err.valid_up_to();
            let rest = buffer.split_off(valid);
            let text = String::from_utf8_lossy(buffer).into_owned();
            *buffer = rest;
            text
        }
        Err(_) => {
            let text = String::from_utf8_lossy(buffer).into_owned();
            buffer.clear();
            text
        }
    }
}

/// Convert a plain-text HTTP [`Response`] into a [`TextStream`].
pub fn text_stream_from_body(response: Response) -> TextStream {
    let stream = async_stream::stream! {
        let mut body = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    pending.extend_from_slice(&bytes);
                    let text = drain_utf8(&mut pending);
                    if !text.is_empty() {
                        yield Ok(text);
                    }
                }
                Err(e) => {
                    yield Err(LLMError::Stream(e.to_string()));
                    break;
                }
            }
        }

        if !pending.is_empty() {
            yield Ok(String::from_utf8_lossy(&pending).into_owned());
        }
    };

    Box::pin(stream)
}
