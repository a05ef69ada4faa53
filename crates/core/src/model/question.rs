use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid answer key: {raw:?}")]
pub struct AnswerKeyError {
    pub raw: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("option {0} cannot be empty")]
    EmptyOption(AnswerKey),

    #[error(transparent)]
    InvalidKey(#[from] AnswerKeyError),

    #[error("question set cannot be empty")]
    EmptySet,
}

//
// ─── ANSWER KEY ───────────────────────────────────────────────────────────────
//

/// The fixed key set shared by options and correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerKey {
    A,
    B,
    C,
    D,
}

impl AnswerKey {
    pub const ALL: [AnswerKey; 4] = [AnswerKey::A, AnswerKey::B, AnswerKey::C, AnswerKey::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerKey::A => "A",
            AnswerKey::B => "B",
            AnswerKey::C => "C",
            AnswerKey::D => "D",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            AnswerKey::A => 0,
            AnswerKey::B => 1,
            AnswerKey::C => 2,
            AnswerKey::D => 3,
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerKey {
    type Err = AnswerKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(AnswerKey::A),
            "B" | "b" => Ok(AnswerKey::B),
            "C" | "c" => Ok(AnswerKey::C),
            "D" | "d" => Ok(AnswerKey::D),
            other => Err(AnswerKeyError {
                raw: other.to_string(),
            }),
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: [String; 4],
    correct: AnswerKey,
}

impl Question {
    /// Build a question, trimming and validating text and options.
    ///
    /// `options` are ordered by `AnswerKey::ALL`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` or `QuestionError::EmptyOption` when
    /// any text is blank.
    pub fn new(
        text: impl Into<String>,
        options: [String; 4],
        correct: AnswerKey,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let options = options.map(|opt| opt.trim().to_string());
        for key in AnswerKey::ALL {
            if options[key.index()].is_empty() {
                return Err(QuestionError::EmptyOption(key));
            }
        }

        Ok(Self {
            text,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn option(&self, key: AnswerKey) -> &str {
        &self.options[key.index()]
    }

    /// Options paired with their keys, in key order.
    pub fn options(&self) -> impl Iterator<Item = (AnswerKey, &str)> {
        AnswerKey::ALL
            .into_iter()
            .map(move |key| (key, self.option(key)))
    }

    #[must_use]
    pub fn correct(&self) -> AnswerKey {
        self.correct
    }
}

//
// ─── QUESTION SET ─────────────────────────────────────────────────────────────
//

/// The ordered questions drawn for one session.
///
/// The default value is the empty set a session holds while still loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Fix the drawn questions for a session.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptySet` if no questions were drawn.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::EmptySet);
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Question] {
        &self.questions
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> [String; 4] {
        ["one".into(), "two".into(), "three".into(), "four".into()]
    }

    #[test]
    fn answer_key_parses_case_insensitively() {
        assert_eq!("a".parse::<AnswerKey>().unwrap(), AnswerKey::A);
        assert_eq!(" D ".parse::<AnswerKey>().unwrap(), AnswerKey::D);
        let err = "E".parse::<AnswerKey>().unwrap_err();
        assert_eq!(err.raw, "E");
    }

    #[test]
    fn question_rejects_blank_text_and_options() {
        let err = Question::new("  ", options(), AnswerKey::A).unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);

        let mut opts = options();
        opts[2] = " ".into();
        let err = Question::new("Q", opts, AnswerKey::A).unwrap_err();
        assert_eq!(err, QuestionError::EmptyOption(AnswerKey::C));
    }

    #[test]
    fn question_exposes_options_by_key() {
        let q = Question::new(" What? ", options(), AnswerKey::B).unwrap();
        assert_eq!(q.text(), "What?");
        assert_eq!(q.option(AnswerKey::C), "three");
        assert_eq!(q.correct(), AnswerKey::B);
        let keys: Vec<_> = q.options().map(|(k, _)| k).collect();
        assert_eq!(keys, AnswerKey::ALL.to_vec());
    }

    #[test]
    fn question_set_must_not_be_empty() {
        assert_eq!(QuestionSet::new(Vec::new()).unwrap_err(), QuestionError::EmptySet);
        assert!(QuestionSet::default().is_empty());
    }
}
