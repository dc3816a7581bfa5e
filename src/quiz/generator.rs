use std::collections::HashSet;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz::{Question, QuizConfig, OPTIONS_PER_QUESTION};

const DISTRACTORS_PER_QUESTION: usize = OPTIONS_PER_QUESTION - 1;

// Stripped from both ends of a word before checking whether it can be a key word
const WORD_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', '(', ')', '[', ']', '{', '}', '"', ':', ';',
];

// Used to make up distractors when the sentence doesn't have enough words of its own
const DISTRACTOR_SUFFIXES: [&str; 4] = ["s", "ed", "ing", "er"];

/// What came out of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    /// At least one question was built from the text.
    Questions(Vec<Question>),
    /// Nothing usable was found, the generic question stands in.
    Fallback(Question),
}

impl Generation {
    pub fn questions(&self) -> &[Question] {
        match self {
            Generation::Questions(questions) => questions,
            Generation::Fallback(question) => std::slice::from_ref(question),
        }
    }

    pub fn into_questions(self) -> Vec<Question> {
        match self {
            Generation::Questions(questions) => questions,
            Generation::Fallback(question) => vec![question],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Generation::Fallback(_))
    }

    pub fn len(&self) -> usize {
        self.questions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions().is_empty()
    }
}

/// A word of a sentence that may be blanked out, with its byte range in the sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyWord<'a> {
    word: &'a str,
    start: usize,
    end: usize,
}

/// Builds fill-in-the-blank questions out of sentences.
#[derive(Debug, Clone)]
pub struct QuestionGenerator {
    min_key_word_chars: usize,
    blank: String,
}

impl QuestionGenerator {
    pub fn new(config: &QuizConfig) -> Self {
        Self {
            min_key_word_chars: config.min_key_word_chars,
            blank: config.blank.clone(),
        }
    }

    /// Generates up to `min(count, sentences.len())` questions.
    ///
    /// A sentence is used at most once per call. When no question at all could be
    /// built, [`Generation::Fallback`] is returned instead of an empty list.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        sentences: &[String],
        count: usize,
        rng: &mut R,
    ) -> Generation {
        let mut questions = Vec::new();
        let mut used_sentences: HashSet<&str> = HashSet::new();

        for _ in 0..count.min(sentences.len()) {
            let available_sentences = sentences
                .iter()
                .map(String::as_str)
                .filter(|s| !used_sentences.contains(s))
                .filter(|s| !self.key_words(s).is_empty())
                .collect::<Vec<_>>();

            let Some(&sentence) = available_sentences.choose(rng) else {
                debug!("No eligible sentences left after {} questions", questions.len());
                break;
            };
            used_sentences.insert(sentence);

            match self.question_from_sentence(sentence, rng) {
                Some(question) => questions.push(question),
                None => debug!("Not enough key words to ask about {:?}", sentence),
            }
        }

        if questions.is_empty() {
            warn!(
                "Could not build any question out of {} sentences, using the fallback question",
                sentences.len()
            );
            return Generation::Fallback(Question::fallback());
        }

        debug!("Generated {} of {} requested questions", questions.len(), count);
        Generation::Questions(questions)
    }

    fn question_from_sentence<R: Rng + ?Sized>(
        &self,
        sentence: &str,
        rng: &mut R,
    ) -> Option<Question> {
        let key_words = self.key_words(sentence);
        let key = *key_words.choose(rng)?;

        // Only the chosen occurrence is blanked, so e.g. "teach" never eats into "teacher"
        let text = format!(
            "{}{}{}",
            &sentence[..key.start],
            self.blank,
            &sentence[key.end..]
        );

        let mut other_words = key_words
            .iter()
            .map(|k| k.word)
            .filter(|w| *w != key.word)
            .collect::<Vec<_>>();
        other_words.sort_unstable();
        other_words.dedup();
        if other_words.is_empty() {
            return None;
        }

        let mut options = other_words
            .choose_multiple(rng, DISTRACTORS_PER_QUESTION)
            .map(|w| w.to_string())
            .collect::<Vec<_>>();

        while options.len() < DISTRACTORS_PER_QUESTION {
            let variations = DISTRACTOR_SUFFIXES
                .iter()
                .map(|suffix| format!("{}{}", key.word, suffix))
                .filter(|variation| !options.contains(variation))
                .collect::<Vec<_>>();
            options.push(variations.choose(rng)?.clone());
        }

        debug!("Blanked {:?} with distractors {:?}", key.word, options);

        // We shuffle the options so the correct one isn't always the last one
        options.push(key.word.to_string());
        options.shuffle(rng);
        let correct_index = options.iter().position(|o| o == key.word)?;

        Some(Question::new(text, options, correct_index))
    }

    /// Words longer than the minimum that are purely alphanumeric once punctuation is stripped.
    fn key_words<'a>(&self, sentence: &'a str) -> Vec<KeyWord<'a>> {
        words_with_offsets(sentence)
            .into_iter()
            .filter_map(|(offset, token)| {
                let word = token.trim_matches(WORD_PUNCTUATION);
                let is_key = word.chars().count() > self.min_key_word_chars
                    && word.chars().all(char::is_alphanumeric);
                if !is_key {
                    return None;
                }
                let start = offset + token.len() - token.trim_start_matches(WORD_PUNCTUATION).len();
                Some(KeyWord {
                    word,
                    start,
                    end: start + word.len(),
                })
            })
            .collect()
    }
}

impl Default for QuestionGenerator {
    fn default() -> Self {
        Self::new(&QuizConfig::default())
    }
}

/// Whitespace separated tokens of `text` with their byte offsets.
fn words_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut word_start = None;

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), word_start) {
            (true, Some(start)) => {
                words.push((start, &text[start..i]));
                word_start = None;
            }
            (false, None) => word_start = Some(i),
            _ => {}
        }
    }
    if let Some(start) = word_start {
        words.push((start, &text[start..]));
    }

    words
}
