use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Time budget granted per drawn question.
pub const SECONDS_PER_QUESTION: u64 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionCountError {
    #[error("question count {0} is not one of 10, 20, 30, 40, 50")]
    OutOfRange(u32),
}

/// Number of questions the participant chose to be drawn for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct QuestionCount(u32);

impl QuestionCount {
    pub const ALLOWED: [u32; 5] = [10, 20, 30, 40, 50];
    pub const DEFAULT: QuestionCount = QuestionCount(10);

    /// Validate a configured count against the allowed set.
    ///
    /// # Errors
    ///
    /// Returns `QuestionCountError::OutOfRange` for any value outside `ALLOWED`.
    pub fn new(value: u32) -> Result<Self, QuestionCountError> {
        if Self::ALLOWED.contains(&value) {
            Ok(Self(value))
        } else {
            Err(QuestionCountError::OutOfRange(value))
        }
    }

    /// Like `new`, but corrects out-of-range values to `DEFAULT`.
    #[must_use]
    pub fn or_default(value: u32) -> Self {
        Self::new(value).unwrap_or(Self::DEFAULT)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Total session time for `questions` drawn questions.
    #[must_use]
    pub fn time_limit_secs(questions: usize) -> u64 {
        u64::try_from(questions)
            .unwrap_or(u64::MAX)
            .saturating_mul(SECONDS_PER_QUESTION)
    }
}

impl Default for QuestionCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for QuestionCount {
    type Error = QuestionCountError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuestionCount> for u32 {
    fn from(count: QuestionCount) -> Self {
        count.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_allowed_counts() {
        for value in QuestionCount::ALLOWED {
            assert_eq!(QuestionCount::new(value).unwrap().get(), value);
        }
        assert_eq!(
            QuestionCount::new(15).unwrap_err(),
            QuestionCountError::OutOfRange(15)
        );
        assert_eq!(QuestionCount::or_default(0), QuestionCount::DEFAULT);
    }

    #[test]
    fn time_limit_is_one_minute_per_question() {
        assert_eq!(QuestionCount::time_limit_secs(10), 600);
        assert_eq!(QuestionCount::time_limit_secs(0), 0);
    }

    #[test]
    fn deserialisation_validates() {
        let ok: QuestionCount = serde_json::from_str("30").unwrap();
        assert_eq!(ok.get(), 30);
        assert!(serde_json::from_str::<QuestionCount>("7").is_err());
    }
}
