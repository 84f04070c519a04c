//! Sentence-based text chunking with overlap for embedding.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::ChunkingConfig;

/// A run of text closed by one or more terminal punctuation marks.
static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("sentence pattern is valid"));

/// Approximate characters per token.
const CHARS_PER_TOKEN: usize = 4;

/// Text chunker that splits content into overlapping, token-bounded chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_tokens: usize,
    /// Words carried from the end of one chunk into the next
    overlap_words: usize,
    min_chunk_size: usize,
    max_chunks: usize,
}

impl TextChunker {
    /// Create a new text chunker with the given configuration.
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            overlap_words: config.overlap_tokens / CHARS_PER_TOKEN,
            min_chunk_size: config.min_chunk_size,
            max_chunks: config.max_chunks,
        }
    }

    /// Create a chunker with default settings.
    pub fn with_defaults() -> Self {
        Self::new(&ChunkingConfig::default())
    }

    /// Split text into chunks.
    ///
    /// Returns nothing for text shorter than the minimum chunk size and the
    /// trimmed text as a single chunk when it already fits the token budget.
    /// Longer text is packed sentence by sentence; a single sentence larger
    /// than the budget becomes an oversized chunk of its own.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        let trimmed_len = char_len(trimmed);

        if trimmed_len < self.min_chunk_size {
            tracing::warn!(
                text_length = trimmed_len,
                min_size = self.min_chunk_size,
                "text too short for chunking"
            );
            return Vec::new();
        }

        let tokens = estimate_tokens(text);
        if tokens <= self.max_tokens {
            tracing::debug!(tokens, "text fits in single chunk");
            return vec![trimmed.to_string()];
        }

        let sentences = split_sentences(text);
        tracing::debug!(
            sentence_count = sentences.len(),
            estimated_tokens = tokens,
            "processing sentences"
        );

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0usize;

        for sentence in sentences {
            let sentence_chars = char_len(sentence);
            let candidate_tokens = (current_chars + 1 + sentence_chars).div_ceil(CHARS_PER_TOKEN);

            if candidate_tokens > self.max_tokens {
                let closed = current.trim();
                if char_len(closed) >= self.min_chunk_size {
                    chunks.push(closed.to_string());
                }

                let overlap = if chunks.is_empty() {
                    String::new()
                } else {
                    self.overlap_tail(&current)
                };
                current = format!("{} {}", overlap, sentence);
                // Drop the overlap when it would push the new chunk over budget
                if !overlap.is_empty()
                    && char_len(&current).div_ceil(CHARS_PER_TOKEN) > self.max_tokens
                {
                    current = format!(" {}", sentence);
                }
                current_chars = char_len(&current);
            } else {
                current.push(' ');
                current.push_str(sentence);
                current_chars += 1 + sentence_chars;
            }

            if chunks.len() >= self.max_chunks {
                tracing::warn!(max_chunks = self.max_chunks, "reached maximum chunk limit");
                break;
            }
        }

        let last = current.trim();
        if char_len(last) >= self.min_chunk_size {
            chunks.push(last.to_string());
        }
        chunks.truncate(self.max_chunks);

        tracing::debug!(
            total_chunks = chunks.len(),
            original_tokens = tokens,
            "text chunking completed"
        );

        chunks
    }

    /// Last few space-separated words of a chunk.
    fn overlap_tail(&self, chunk: &str) -> String {
        if self.overlap_words == 0 {
            return String::new();
        }
        let words: Vec<&str> = chunk.split(' ').collect();
        let start = words.len().saturating_sub(self.overlap_words);
        words[start..].join(" ")
    }
}

/// Split text into sentences, keeping any unterminated tail as a final one.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut end = 0;

    for m in SENTENCE.find_iter(text) {
        sentences.push(m.as_str());
        end = m.end();
    }

    if sentences.is_empty() {
        return vec![text];
    }

    let tail = &text[end..];
    if !tail.trim().is_empty() {
        sentences.push(tail);
    }

    sentences
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Estimate the number of tokens in a text.
/// Uses a simple heuristic: ~4 characters per token, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    char_len(text).div_ceil(CHARS_PER_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence {i} describes the product catalogue entry in moderate detail."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("1234"), 1);
        assert_eq!(estimate_tokens("12345"), 2);
        assert_eq!(estimate_tokens("12345678"), 2);
    }

    #[test]
    fn test_short_text_is_dropped() {
        let chunker = TextChunker::with_defaults();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("Hello, world!").is_empty());
        let padded = format!("   {}   ", "a".repeat(99));
        assert!(chunker.chunk(&padded).is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunker = TextChunker::with_defaults();
        let text = format!("  {}  ", "a".repeat(150));
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks, vec!["a".repeat(150)]);
    }

    #[test]
    fn test_long_text_respects_token_budget() {
        let chunker = TextChunker::with_defaults();
        let text = catalogue_text(300);
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(estimate_tokens(chunk) <= 512, "chunk over budget: {}", chunk.len());
            assert!(chunk.chars().count() >= 100);
            assert_eq!(chunk, chunk.trim());
        }
    }

    #[test]
    fn test_chunks_carry_overlap() {
        let chunker = TextChunker::with_defaults();
        let chunks = chunker.chunk(&catalogue_text(300));

        for pair in chunks.windows(2) {
            let tail: Vec<&str> = pair[0].split_whitespace().rev().take(3).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            let head: Vec<&str> = pair[1].split_whitespace().take(12).collect();
            assert!(
                head.join(" ").contains(&tail.join(" ")),
                "next chunk does not start with the previous tail"
            );
        }
    }

    #[test]
    fn test_overlap_dropped_when_it_would_overflow() {
        let chunker = TextChunker::with_defaults();
        // 1995 chars each, 499 tokens
        let sentence = format!("{}.", "abcd ".repeat(399).trim_end());
        let text = format!("{sentence} {sentence}");
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks, vec![sentence.clone(), sentence]);
        for chunk in &chunks {
            assert!(estimate_tokens(chunk) <= 512);
        }
    }

    #[test]
    fn test_no_terminal_punctuation_is_one_sentence() {
        let chunker = TextChunker::with_defaults();
        let text = "word ".repeat(1000);
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text.trim());
        assert!(estimate_tokens(&chunks[0]) > 512);
    }

    #[test]
    fn test_unterminated_tail_is_kept() {
        let chunker = TextChunker::with_defaults();
        let text = format!("{} URL: https://shop example without a full stop", catalogue_text(60));
        let chunks = chunker.chunk(&text);

        assert!(
            chunks
                .last()
                .unwrap()
                .ends_with("https://shop example without a full stop")
        );
    }

    #[test]
    fn test_max_chunks_limit() {
        let config = ChunkingConfig {
            max_chunks: 3,
            ..Default::default()
        };
        let chunker = TextChunker::new(&config);
        let chunks = chunker.chunk(&catalogue_text(300));

        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_default_max_chunks_limit() {
        let chunker = TextChunker::with_defaults();
        // Roughly 30 sentences per chunk, so this overflows 500 chunks
        let chunks = chunker.chunk(&catalogue_text(20_000));

        assert_eq!(chunks.len(), 500);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = TextChunker::with_defaults();
        let text = catalogue_text(120);
        assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("One. Two! Three? rest"),
            vec!["One.", " Two!", " Three?", " rest"]
        );
        assert_eq!(split_sentences("no stops here"), vec!["no stops here"]);
    }
}
