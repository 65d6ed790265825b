//! Offline provider that streams filler text.
//!
//! Plugs into the same [`CompletionProvider`] seam as the network providers so
//! the chat flow can run without a model, a network or credentials.

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::provider::{CompletionProvider, Result, TextStream};
use crate::types::CompletionRequest;

const FILLER_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat",
];

pub struct MockProvider {
    word_count: RangeInclusive<usize>,
    delay_ms: RangeInclusive<u64>,
    seed: Option<u64>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            word_count: 20..=80,
            delay_ms: 10..=60,
            seed: None,
        }
    }

    /// Bounds given in reverse are swapped.
    pub fn with_word_count(mut self, word_count: RangeInclusive<usize>) -> Self {
        self.word_count = ordered(word_count);
        self
    }

    /// Bounds given in reverse are swapped.
    pub fn with_delay_ms(mut self, delay_ms: RangeInclusive<u64>) -> Self {
        self.delay_ms = ordered(delay_ms);
        self
    }

    /// Make the generated text and delays reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Tokens and the delay before each one.
    fn plan(&self) -> Vec<(String, Duration)> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let count = rng.gen_range(self.word_count.clone()).max(1);
        let mut sentence_len = 0usize;
        (0..count)
            .map(|index| {
                let word = FILLER_WORDS.choose(&mut rng).copied().unwrap_or("lorem");
                let mut token = if index == 0 {
                    capitalize(word)
                } else if sentence_len == 0 {
                    format!(" {}", capitalize(word))
                } else {
                    format!(" {word}")
                };
                sentence_len += 1;

                if index + 1 == count || (sentence_len >= 6 && rng.gen_bool(0.2)) {
                    token.push('.');
                    sentence_len = 0;
                }

                let delay = Duration::from_millis(rng.gen_range(self.delay_ms.clone()));
                (token, delay)
            })
            .collect()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn ordered<T: PartialOrd + Copy>(range: RangeInclusive<T>) -> RangeInclusive<T> {
    let (start, end) = range.into_inner();
    if start <= end {
        start..=end
    } else {
        end..=start
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn stream_completion(&self, request: &CompletionRequest) -> Result<TextStream> {
        let plan = self.plan();
        log::debug!(
            "Mock provider streaming {} tokens for {} messages",
            plan.len(),
            request.messages.len()
        );

        let stream = async_stream::stream! {
            for (token, delay) in plan {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(token);
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiProvider;
    use futures_util::StreamExt;

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![], "mock", ApiProvider::Mock)
    }

    async fn collect(provider: &MockProvider) -> Vec<String> {
        provider
            .stream_completion(&request())
            .await
            .expect("stream")
            .map(|chunk| chunk.expect("chunk"))
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_streams_requested_number_of_tokens() {
        let provider = MockProvider::new()
            .with_word_count(5..=5)
            .with_delay_ms(0..=0)
            .with_seed(7);

        let tokens = collect(&provider).await;
        assert_eq!(tokens.len(), 5);

        let text = tokens.concat();
        assert!(text.ends_with('.'));
        assert!(text.chars().next().unwrap().is_uppercase());
    }

    #[tokio::test]
    async fn test_seed_makes_output_reproducible() {
        let provider = MockProvider::new().with_delay_ms(0..=0).with_seed(42);
        assert_eq!(collect(&provider).await, collect(&provider).await);
    }

    #[tokio::test]
    async fn test_reversed_ranges_are_accepted() {
        #[allow(clippy::reversed_empty_ranges)]
        let provider = MockProvider::new()
            .with_word_count(5..=3)
            .with_delay_ms(1..=0)
            .with_seed(3);

        let tokens = collect(&provider).await;
        assert!((3..=5).contains(&tokens.len()));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("lorem"), "Lorem");
        assert_eq!(capitalize(""), "");
    }
}
