pub mod engine;
pub mod generator;
pub mod sentences;
pub mod session;

pub use engine::QuizEngine;
pub use generator::{Generation, QuestionGenerator};
pub use sentences::SentenceSegmenter;
pub use session::{AnswerOutcome, QuizSession, SessionError, SessionState};

/// Number of options every question carries: the key word plus three distractors.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Most questions a single quiz may hold.
pub const MAX_QUESTIONS_PER_QUIZ: usize = 10;

const FALLBACK_QUESTION_TEXT: &str = "What is this text about?";
const FALLBACK_OPTIONS: [&str; OPTIONS_PER_QUESTION] =
    ["Main Topic", "Secondary Topic", "Related Topic", "Other Topic"];

/// Tunables for sentence segmentation and question generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    /// A sentence is kept only if it is strictly longer than this (in chars, after trimming).
    pub min_sentence_chars: usize,
    /// A key word must be strictly longer than this (in chars, after stripping punctuation).
    pub min_key_word_chars: usize,
    /// Upper bound for the number of questions in one quiz, itself capped at [`MAX_QUESTIONS_PER_QUIZ`].
    pub max_questions: usize,
    /// Marker that replaces the key word in the question text.
    pub blank: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            min_sentence_chars: 20,
            min_key_word_chars: 4,
            max_questions: MAX_QUESTIONS_PER_QUIZ,
            blank: "_____".to_string(),
        }
    }
}

/// Progress through an ordered set of questions.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
    pub current_question: usize,
    pub score: u32,
}

impl Quiz {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            current_question: 0,
            score: 0,
        }
    }
}

/// A fill-in-the-blank question with four options.
///
/// `options[correct_index]` is the word that was blanked out of `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    pub fn new(text: String, options: Vec<String>, correct_index: usize) -> Self {
        debug_assert_eq!(options.len(), OPTIONS_PER_QUESTION);
        debug_assert!(correct_index < options.len());
        Self {
            text,
            options,
            correct_index,
        }
    }

    /// The generic question used when nothing could be generated from the text.
    pub fn fallback() -> Self {
        Self::new(
            FALLBACK_QUESTION_TEXT.to_string(),
            FALLBACK_OPTIONS.iter().map(|o| o.to_string()).collect(),
            0,
        )
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }

    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.correct_index)
            .map(String::as_str)
            .unwrap_or_default()
    }
}
