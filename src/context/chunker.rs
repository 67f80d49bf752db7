//! Overlapping text chunker.
//!
//! Windows are cut by [`text_splitter`] at the coarsest boundary that fits:
//! paragraphs, then lines, sentences, words and finally graphemes. Sizes
//! are counted in characters.

use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// Splits text into chunks of at most `size` characters, each sharing up to
/// `overlap` characters with its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Creates a chunker. A zero size is treated as one, and the overlap is
    /// capped below the size.
    #[must_use]
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            overlap: overlap.min(size - 1),
        }
    }

    /// Maximum chunk length in characters.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Splits `text`. Every chunk is trimmed and whitespace-only chunks are dropped.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        let config = ChunkConfig::new(self.size)
            .with_overlap(self.overlap)
            .unwrap_or_else(|_| ChunkConfig::new(self.size));
        let chunks: Vec<String> = TextSplitter::new(config)
            .chunks(text)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect();
        debug!(
            input_len = text.len(),
            chunk_count = chunks.len(),
            chunk_size = self.size,
            "text chunked"
        );
        chunks
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use unicode_segmentation::UnicodeSegmentation;

    use super::*;

    fn grapheme_len(s: &str) -> usize {
        s.graphemes(true).count()
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(Chunker::new(500, 100).split("  hello world \n"), vec!["hello world"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(Chunker::new(10, 2).split("").is_empty());
        assert!(Chunker::new(10, 2).split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_prefers_line_breaks() {
        let text = "first line here\nsecond line here\nthird";
        let chunks = Chunker::new(20, 0).split(text);
        assert_eq!(chunks, vec!["first line here", "second line here", "third"]);
    }

    #[test]
    fn test_windows_overlap() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda";
        let chunks = Chunker::new(20, 10).split(text);
        assert!(chunks.len() > 1);
        let shares_word = |a: &str, b: &str| {
            a.split_whitespace().any(|w| b.split_whitespace().any(|x| x == w))
        };
        assert!(chunks.windows(2).any(|w| shares_word(&w[0], &w[1])));
        assert!(Chunker::new(20, 0)
            .split(text)
            .windows(2)
            .all(|w| !shares_word(&w[0], &w[1])));
    }

    #[test]
    fn test_multibyte_graphemes_are_not_split() {
        let text = "é".repeat(12) + &"👍🏽".repeat(12);
        for chunk in Chunker::new(5, 1).split(&text) {
            assert!(grapheme_len(&chunk) <= 5);
            assert!(!chunk.starts_with('\u{1f3fd}'));
        }
    }

    #[test]
    fn test_overlap_not_smaller_than_size_is_capped() {
        let chunker = Chunker::new(4, 10);
        let chunks = chunker.split("abcdefgh");
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert_eq!(Chunker::new(0, 3).size(), 1);
    }

    proptest! {
        #[test]
        fn prop_chunks_are_bounded_and_nonempty(
            text in "[a-z \\n]{0,400}",
            size in 1usize..60,
            overlap in 0usize..30,
        ) {
            let chunks = Chunker::new(size, overlap).split(&text);
            for chunk in &chunks {
                prop_assert!(!chunk.is_empty());
                prop_assert!(grapheme_len(chunk) <= size);
            }
            if !text.trim().is_empty() {
                prop_assert!(!chunks.is_empty());
            }
        }

        #[test]
        fn prop_every_word_is_covered(words in prop::collection::vec("[a-z]{1,8}", 1..40)) {
            let text = words.join(" ");
            let chunks = Chunker::new(20, 5).split(&text);
            let joined = chunks.join(" ");
            for word in &words {
                prop_assert!(joined.contains(word.as_str()));
            }
        }
    }
}
