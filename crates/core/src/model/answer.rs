use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::model::AnswerKey;

/// Persisted marker for a question the participant never answered.
pub const UNANSWERED: &str = "Unanswered";

/// The participant's selection for one question.
///
/// Serialises as the key letter, or the `"Unanswered"` sentinel. A JSON `null`
/// is read back as `Unanswered` as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Answer {
    Selected(AnswerKey),
    #[default]
    Unanswered,
}

impl Answer {
    #[must_use]
    pub fn key(self) -> Option<AnswerKey> {
        match self {
            Answer::Selected(key) => Some(key),
            Answer::Unanswered => None,
        }
    }

    #[must_use]
    pub fn is_answered(self) -> bool {
        matches!(self, Answer::Selected(_))
    }

    /// True when this answer selects exactly `correct`.
    #[must_use]
    pub fn matches(self, correct: AnswerKey) -> bool {
        self == Answer::Selected(correct)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Selected(key) => key.as_str(),
            Answer::Unanswered => UNANSWERED,
        }
    }
}

impl From<AnswerKey> for Answer {
    fn from(key: AnswerKey) -> Self {
        Answer::Selected(key)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some(UNANSWERED) => Ok(Answer::Unanswered),
            Some(other) => other
                .parse::<AnswerKey>()
                .map(Answer::Selected)
                .map_err(serde::de::Error::custom),
        }
    }
}
