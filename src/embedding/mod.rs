// Embedding module
// Maps free text to fixed-dimension dense vectors via a pretrained encoder backend

pub mod ollama;

pub use ollama::OllamaEncoder;

use std::borrow::Cow;

use crate::Result;

/// Contract for an embedding backend.
///
/// Implementations must be deterministic given fixed model weights: the same
/// input text always yields the same vector, with a fixed dimensionality per
/// backend. Any backend satisfying this contract is substitutable.
pub trait TextEncoder: Send + Sync {
    /// Encode a single text into a dense vector.
    ///
    /// Empty or whitespace-only input is rejected rather than encoded, so the
    /// result is always a vector over real content.
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode several texts, preserving input order.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }
}

/// Estimate the token count of a text input
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}

/// Truncate an input to roughly `max_tokens`, keeping the leading content and
/// dropping the remainder. Deliberately lossy: encoder windows are bounded and
/// the head of a clinical summary carries the classification and key factors.
#[inline]
pub fn truncate_input(text: &str, max_tokens: usize) -> Cow<'_, str> {
    if estimate_token_count(text) <= max_tokens {
        return Cow::Borrowed(text);
    }

    // Token estimate maps back to a word budget; cut at the word boundary
    let word_budget = ((max_tokens as f64) * 0.75) as usize;
    let mut words_seen = 0;
    let mut cut = text.len();
    let mut in_word = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words_seen += 1;
            if words_seen > word_budget {
                cut = idx;
                break;
            }
        }
    }

    Cow::Owned(text.get(..cut).unwrap_or(text).trim_end().to_string())
}
