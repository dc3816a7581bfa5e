use std::fmt;

use thiserror::Error;

use crate::quiz::{Question, Quiz, MAX_QUESTIONS_PER_QUIZ};

/// Which phase a [`QuizSession`] is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    InProgress,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Empty => "empty",
            SessionState::InProgress => "in progress",
            SessionState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Misuse of a session by the code driving it. Never caused by what the user answers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {operation} a quiz session that is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: SessionState,
    },

    #[error("a quiz session needs at least one question")]
    NoQuestions,

    #[error("a quiz session holds at most {max} questions, got {count}")]
    TooManyQuestions { count: usize, max: usize },
}

/// What happened when an answer was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub was_correct: bool,
    pub correct_option: String,
    pub is_complete: bool,
    pub score: u32,
    pub total_questions: usize,
}

/// One user's way through a quiz.
///
/// Transitions consume the session and hand back the next one, so the caller can keep
/// sessions in any keyed store (e.g. dialogue storage) and simply write the new value back.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum QuizSession {
    #[default]
    Empty,
    InProgress(Quiz),
    Completed {
        score: u32,
        total_questions: usize,
    },
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match self {
            QuizSession::Empty => SessionState::Empty,
            QuizSession::InProgress(_) => SessionState::InProgress,
            QuizSession::Completed { .. } => SessionState::Completed,
        }
    }

    pub fn start(self, questions: Vec<Question>) -> Result<Self, SessionError> {
        if !matches!(self, QuizSession::Empty) {
            return Err(self.invalid("start"));
        }
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }
        if questions.len() > MAX_QUESTIONS_PER_QUIZ {
            return Err(SessionError::TooManyQuestions {
                count: questions.len(),
                max: MAX_QUESTIONS_PER_QUIZ,
            });
        }
        Ok(QuizSession::InProgress(Quiz::new(questions)))
    }

    pub fn current_question(&self) -> Result<&Question, SessionError> {
        match self {
            QuizSession::InProgress(quiz) => quiz
                .questions
                .get(quiz.current_question)
                .ok_or_else(|| self.invalid("read the current question of")),
            _ => Err(self.invalid("read the current question of")),
        }
    }

    /// Scores `selected_index` against the current question and moves on to the next one.
    pub fn submit_answer(self, selected_index: usize) -> Result<(Self, AnswerOutcome), SessionError> {
        let mut quiz = match self {
            QuizSession::InProgress(quiz) => quiz,
            other => return Err(other.invalid("submit an answer to")),
        };

        let question = quiz
            .questions
            .get(quiz.current_question)
            .ok_or(SessionError::InvalidTransition {
                operation: "submit an answer to",
                state: SessionState::Completed,
            })?;
        let was_correct = selected_index == question.correct_index;
        let correct_option = question.correct_option().to_string();

        if was_correct {
            quiz.score += 1;
        }
        quiz.current_question += 1;

        let total_questions = quiz.questions.len();
        let is_complete = quiz.current_question >= total_questions;
        let outcome = AnswerOutcome {
            was_correct,
            correct_option,
            is_complete,
            score: quiz.score,
            total_questions,
        };

        let next = if is_complete {
            QuizSession::Completed {
                score: quiz.score,
                total_questions,
            }
        } else {
            QuizSession::InProgress(quiz)
        };
        Ok((next, outcome))
    }

    /// Number of the question being asked, counting from 1.
    pub fn question_number(&self) -> Option<usize> {
        match self {
            QuizSession::InProgress(quiz) => Some(quiz.current_question + 1),
            _ => None,
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            QuizSession::Empty => 0,
            QuizSession::InProgress(quiz) => quiz.score,
            QuizSession::Completed { score, .. } => *score,
        }
    }

    pub fn total_questions(&self) -> usize {
        match self {
            QuizSession::Empty => 0,
            QuizSession::InProgress(quiz) => quiz.questions.len(),
            QuizSession::Completed {
                total_questions, ..
            } => *total_questions,
        }
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            operation,
            state: self.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct_index: usize) -> Question {
        Question::new(
            "Water boils at one _____ degrees.".to_string(),
            vec!["hundred", "thousand", "twenty", "eighty"]
                .into_iter()
                .map(String::from)
                .collect(),
            correct_index,
        )
    }

    #[test]
    fn starts_in_progress_at_the_first_question() {
        let session = QuizSession::new().start(vec![question(2), question(0)]).unwrap();
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.current_question().unwrap(), &question(2));
        assert_eq!(session.question_number(), Some(1));
        assert_eq!(session.score(), 0);
        assert_eq!(session.total_questions(), 2);
    }

    #[test]
    fn cannot_start_without_questions() {
        assert_eq!(
            QuizSession::new().start(Vec::new()),
            Err(SessionError::NoQuestions)
        );
    }

    #[test]
    fn cannot_start_with_more_than_ten_questions() {
        let session = QuizSession::new().start(vec![question(0); 10]).unwrap();
        assert_eq!(session.total_questions(), 10);
        assert_eq!(
            QuizSession::new().start(vec![question(0); 11]),
            Err(SessionError::TooManyQuestions { count: 11, max: 10 })
        );
    }

    #[test]
    fn cannot_start_twice() {
        let session = QuizSession::new().start(vec![question(0)]).unwrap();
        assert_eq!(
            session.start(vec![question(1)]),
            Err(SessionError::InvalidTransition {
                operation: "start",
                state: SessionState::InProgress,
            })
        );
    }

    #[test]
    fn wrong_answer_reports_correct_option_and_keeps_score() {
        let session = QuizSession::new().start(vec![question(0), question(1)]).unwrap();
        let (session, outcome) = session.submit_answer(3).unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome {
                was_correct: false,
                correct_option: "hundred".to_string(),
                is_complete: false,
                score: 0,
                total_questions: 2,
            }
        );
        assert_eq!(session.current_question().unwrap(), &question(1));
        assert_eq!(session.question_number(), Some(2));
    }

    #[test]
    fn last_answer_completes_the_session() {
        let session = QuizSession::new().start(vec![question(1)]).unwrap();
        let (session, outcome) = session.submit_answer(1).unwrap();
        assert!(outcome.was_correct);
        assert!(outcome.is_complete);
        assert_eq!(outcome.score, 1);
        assert_eq!(
            session,
            QuizSession::Completed {
                score: 1,
                total_questions: 1,
            }
        );
        assert_eq!(session.question_number(), None);
    }

    #[test]
    fn rejects_answers_outside_a_running_quiz() {
        let err = QuizSession::new().submit_answer(0).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                operation: "submit an answer to",
                state: SessionState::Empty,
            }
        );

        let (completed, _) = QuizSession::new()
            .start(vec![question(0)])
            .unwrap()
            .submit_answer(0)
            .unwrap();
        assert!(completed.current_question().is_err());
        let err = completed.submit_answer(0).unwrap_err();
        assert_eq!(err.to_string(), "cannot submit an answer to a quiz session that is completed");
    }

    #[test]
    fn out_of_range_selection_counts_as_wrong() {
        let session = QuizSession::new().start(vec![question(0)]).unwrap();
        let (_, outcome) = session.submit_answer(42).unwrap();
        assert!(!outcome.was_correct);
        assert_eq!(outcome.score, 0);
    }
}
