use std::str::FromStr;

use quizbot::quiz::{QuizConfig, MAX_QUESTIONS_PER_QUIZ};
use thiserror::Error;

const DB_PATH_VAR: &str = "QUIZBOT_DB_PATH";
const MAX_QUESTIONS_VAR: &str = "QUIZBOT_MAX_QUESTIONS";
const MAX_DOCUMENT_BYTES_VAR: &str = "QUIZBOT_MAX_DOCUMENT_BYTES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be at most {max}, got {value}")]
    TooLarge {
        name: &'static str,
        value: usize,
        max: usize,
    },
}

/// Runtime settings of the bot. The bot token itself is read by teloxide (`TELOXIDE_TOKEN`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub db_path: String,
    pub max_questions: usize,
    pub max_document_bytes: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            db_path: "db.sqlite".to_string(),
            max_questions: QuizConfig::default().max_questions,
            max_document_bytes: 5 * 1024 * 1024,
        }
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_questions = positive_number(&lookup, MAX_QUESTIONS_VAR)?
            .unwrap_or(defaults.max_questions);
        if max_questions > MAX_QUESTIONS_PER_QUIZ {
            return Err(ConfigError::TooLarge {
                name: MAX_QUESTIONS_VAR,
                value: max_questions,
                max: MAX_QUESTIONS_PER_QUIZ,
            });
        }
        Ok(Self {
            db_path: lookup(DB_PATH_VAR).unwrap_or(defaults.db_path),
            max_questions,
            max_document_bytes: positive_number(&lookup, MAX_DOCUMENT_BYTES_VAR)?
                .unwrap_or(defaults.max_document_bytes),
        })
    }

    pub fn quiz_config(&self) -> QuizConfig {
        QuizConfig {
            max_questions: self.max_questions,
            ..QuizConfig::default()
        }
    }
}

fn positive_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr + Default + PartialOrd,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    match value.trim().parse::<T>() {
        Ok(number) if number > T::default() => Ok(Some(number)),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = BotConfig::from_lookup(lookup_in(&[])).unwrap();
        assert_eq!(config, BotConfig::default());
        assert_eq!(config.quiz_config().max_questions, 10);
    }

    #[test]
    fn reads_overrides() {
        let config = BotConfig::from_lookup(lookup_in(&[
            (DB_PATH_VAR, "/tmp/quiz.sqlite"),
            (MAX_QUESTIONS_VAR, " 5 "),
            (MAX_DOCUMENT_BYTES_VAR, "1024"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, "/tmp/quiz.sqlite");
        assert_eq!(config.max_questions, 5);
        assert_eq!(config.max_document_bytes, 1024);
        assert_eq!(config.quiz_config().max_questions, 5);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!(
            BotConfig::from_lookup(lookup_in(&[(MAX_QUESTIONS_VAR, "0")])),
            Err(ConfigError::InvalidNumber {
                name: MAX_QUESTIONS_VAR,
                value: "0".to_string(),
            })
        );
        assert!(BotConfig::from_lookup(lookup_in(&[(MAX_DOCUMENT_BYTES_VAR, "lots")])).is_err());
    }

    #[test]
    fn rejects_more_questions_than_a_quiz_holds() {
        assert!(BotConfig::from_lookup(lookup_in(&[(MAX_QUESTIONS_VAR, "10")])).is_ok());
        assert_eq!(
            BotConfig::from_lookup(lookup_in(&[(MAX_QUESTIONS_VAR, "11")])),
            Err(ConfigError::TooLarge {
                name: MAX_QUESTIONS_VAR,
                value: 11,
                max: 10,
            })
        );
    }
}
