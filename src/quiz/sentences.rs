use log::debug;

use crate::quiz::QuizConfig;

// Every terminator token (". ", "!\n", ...) reduces to one of these once trimmed.
// The trimmed buffer can only start ending with one when that char is pushed.
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Splits raw text into candidate sentences using punctuation heuristics.
#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    min_chars: usize,
}

impl SentenceSegmenter {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    pub fn from_config(config: &QuizConfig) -> Self {
        Self::new(config.min_sentence_chars)
    }

    /// Returns the trimmed sentences that are longer than the minimum length.
    ///
    /// Short fragments are dropped, they are never glued onto the next sentence.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut current = String::new();

        for c in text.chars() {
            current.push(c);
            if SENTENCE_TERMINATORS.contains(&c) {
                self.keep_if_long_enough(&current, &mut sentences);
                current.clear();
            }
        }
        self.keep_if_long_enough(&current, &mut sentences);

        debug!(
            "Segmented {} chars of text into {} sentences",
            text.len(),
            sentences.len()
        );
        sentences
    }

    fn keep_if_long_enough(&self, candidate: &str, sentences: &mut Vec<String>) {
        let trimmed = candidate.trim();
        if trimmed.chars().count() > self.min_chars {
            sentences.push(trimmed.to_string());
        }
    }
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::from_config(&QuizConfig::default())
    }
}
