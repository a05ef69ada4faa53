use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerTally;
use crate::model::Answer;

/// Lifecycle of a quiz session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Loading,
    InProgress,
    Completing,
    Completed,
}

impl SessionState {
    /// True once the session has left `InProgress` for good.
    #[must_use]
    pub fn is_finishing(self) -> bool {
        matches!(self, SessionState::Completing | SessionState::Completed)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == SessionState::Completed
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionResultError {
    #[error("score {score} exceeds total questions {total}")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("expected {expected} per-question entries, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("too many questions for a single session: {len}")]
    TooManyQuestions { len: usize },
}

/// Final, immutable outcome of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    final_score: u32,
    total_questions: u32,
    time_spent: Vec<u64>,
    answers: Vec<Answer>,
    auto_submitted: bool,
    completed_at: DateTime<Utc>,
}

impl SessionResult {
    /// Build the result from a finalized ledger.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError::TooManyQuestions` if the question count
    /// cannot fit in `u32`.
    pub fn from_tally(
        tally: LedgerTally,
        auto_submitted: bool,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionResultError> {
        let len = tally.answers.len();
        let total =
            u32::try_from(len).map_err(|_| SessionResultError::TooManyQuestions { len })?;
        Self::from_persisted(
            tally.score,
            total,
            tally.time_spent,
            tally.answers,
            auto_submitted,
            completed_at,
        )
    }

    /// Rehydrate a result, checking that the per-question records line up.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError` when the score exceeds the total or the
    /// per-question vectors do not match the total.
    pub fn from_persisted(
        final_score: u32,
        total_questions: u32,
        time_spent: Vec<u64>,
        answers: Vec<Answer>,
        auto_submitted: bool,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionResultError> {
        if final_score > total_questions {
            return Err(SessionResultError::ScoreExceedsTotal {
                score: final_score,
                total: total_questions,
            });
        }
        let expected = usize::try_from(total_questions).unwrap_or(usize::MAX);
        for found in [answers.len(), time_spent.len()] {
            if found != expected {
                return Err(SessionResultError::LengthMismatch { expected, found });
            }
        }

        Ok(Self {
            final_score,
            total_questions,
            time_spent,
            answers,
            auto_submitted,
            completed_at,
        })
    }

    #[must_use]
    pub fn final_score(&self) -> u32 {
        self.final_score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn time_spent(&self) -> &[u64] {
        &self.time_spent
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn auto_submitted(&self) -> bool {
        self.auto_submitted
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
