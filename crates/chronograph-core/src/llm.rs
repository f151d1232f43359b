//! The one external LLM collaborator this crate calls out to: a plain
//! `(prompt, context) -> text` contract. Model choice, prompt wording and
//! token accounting beyond the crude word-count approximation are explicitly
//! out of scope (see Non-goals) — this trait is only the data contract other
//! components (`DeltaSummarizer`, `CommunityCompactor`) drive.

use async_trait::async_trait;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm call failed: {0}")]
    CallFailed(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, context: &str) -> Result<String>;
}

/// `words × 1.3`, the Python adapter's approximation — not a tokenizer call.
pub fn approximate_token_count(text: &str) -> usize {
    let words = text.split_whitespace().count();
    ((words as f64) * 1.3).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approximate_token_count_matches_word_count_times_1_3() {
        assert_eq!(approximate_token_count("one two three four"), 5);
        assert_eq!(approximate_token_count(""), 0);
    }
}
