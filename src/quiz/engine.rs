use log::debug;
use rand::Rng;

use crate::quiz::{Generation, QuestionGenerator, QuizConfig, SentenceSegmenter, MAX_QUESTIONS_PER_QUIZ};

/// Turns extracted document text into quiz questions.
///
/// Holds no state between calls; the random source is supplied by the caller.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    config: QuizConfig,
    segmenter: SentenceSegmenter,
    generator: QuestionGenerator,
}

impl QuizEngine {
    pub fn new(config: QuizConfig) -> Self {
        Self {
            segmenter: SentenceSegmenter::from_config(&config),
            generator: QuestionGenerator::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Generates up to `requested_count` questions, clamped to `1..=max_questions`.
    ///
    /// The result always fits into a [`QuizSession`](crate::quiz::QuizSession).
    pub fn generate_quiz<R: Rng + ?Sized>(
        &self,
        text: &str,
        requested_count: usize,
        rng: &mut R,
    ) -> Generation {
        let count = self.clamp_count(requested_count);
        let sentences = self.segmenter.segment(text);
        debug!(
            "Generating {} questions (requested {}) from {} sentences",
            count,
            requested_count,
            sentences.len()
        );
        self.generator.generate(&sentences, count, rng)
    }

    pub fn clamp_count(&self, requested_count: usize) -> usize {
        let max_questions = self.config.max_questions.clamp(1, MAX_QUESTIONS_PER_QUIZ);
        requested_count.clamp(1, max_questions)
    }
}

impl Default for QuizEngine {
    fn default() -> Self {
        Self::new(QuizConfig::default())
    }
}
