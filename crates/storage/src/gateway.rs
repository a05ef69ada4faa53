//! Typed access to the persisted quiz keys.
//!
//! Every screen reads and writes through this gateway instead of touching the
//! raw key/value store. Values are JSON; reads fall back to a typed default
//! when a key is absent or holds something unparsable.

use std::sync::Arc;

use quiz_core::model::{Answer, Question, QuestionCount, QuestionSet, SessionResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::repository::{KeyValueStore, QuestionRecord, StorageError};

/// Keys owned by the quiz.
pub mod keys {
    pub const QUESTION_COUNT: &str = "questionCount";
    pub const QUESTIONS: &str = "quizQuestions";
    pub const ANSWERS: &str = "userAnswers";
    pub const TIME_SPENT: &str = "timeSpent";
    pub const SCORE: &str = "quizScore";
    pub const TOTAL_QUESTIONS: &str = "totalQuestions";
    pub const AUTO_SUBMITTED: &str = "autoSubmitted";

    /// Keys removed when the participant clears their quiz data.
    pub const RESULT_KEYS: [&str; 6] = [
        SCORE,
        TOTAL_QUESTIONS,
        ANSWERS,
        QUESTIONS,
        AUTO_SUBMITTED,
        TIME_SPENT,
    ];
}

#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceGateway {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    //
    // ─── CONFIGURATION ──────────────────────────────────────────────────────
    //

    /// The raw configured count, if one is stored and numeric.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn configured_count(&self) -> Result<Option<u32>, StorageError> {
        let Some(raw) = self.store.get(keys::QUESTION_COUNT).await? else {
            return Ok(None);
        };
        let parsed = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Ok(serde_json::Value::String(s)) => s.trim().parse::<u32>().ok(),
            _ => raw.trim().parse::<u32>().ok(),
        };
        if parsed.is_none() {
            warn!(key = keys::QUESTION_COUNT, value = %raw, "ignoring malformed question count");
        }
        Ok(parsed)
    }

    /// Number of questions to draw from a bank of `bank_size`.
    ///
    /// Absent or malformed config means the whole bank; a count outside the
    /// allowed set is corrected to the default. The result never exceeds
    /// `bank_size`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn question_count(&self, bank_size: usize) -> Result<usize, StorageError> {
        let count = match self.configured_count().await? {
            None => bank_size,
            Some(raw) => {
                let count = QuestionCount::new(raw).unwrap_or_else(|err| {
                    warn!(%err, "correcting configured question count to default");
                    QuestionCount::DEFAULT
                });
                usize::try_from(count.get()).unwrap_or(bank_size)
            }
        };
        Ok(count.min(bank_size))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    pub async fn set_question_count(&self, count: QuestionCount) -> Result<(), StorageError> {
        self.write_json(keys::QUESTION_COUNT, &count.get()).await
    }

    //
    // ─── SESSION OUTPUT ─────────────────────────────────────────────────────
    //

    /// Persist the drawn questions for downstream review.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    pub async fn save_question_set(&self, questions: &QuestionSet) -> Result<(), StorageError> {
        let records: Vec<QuestionRecord> =
            questions.iter().map(QuestionRecord::from_question).collect();
        self.write_json(keys::QUESTIONS, &records).await
    }

    /// Persist every key a finished session produces.
    ///
    /// `autoSubmitted` is only present when true.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any write fails.
    pub async fn save_result(&self, result: &SessionResult) -> Result<(), StorageError> {
        self.write_json(keys::ANSWERS, &result.answers()).await?;
        self.write_json(keys::TIME_SPENT, &result.time_spent()).await?;
        self.write_json(keys::SCORE, &result.final_score()).await?;
        self.write_json(keys::TOTAL_QUESTIONS, &result.total_questions())
            .await?;
        if result.auto_submitted() {
            self.write_json(keys::AUTO_SUBMITTED, &true).await?;
        } else {
            self.store.remove(keys::AUTO_SUBMITTED).await?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn question_records(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        Ok(self.read_json(keys::QUESTIONS).await?.unwrap_or_default())
    }

    /// Drawn questions of the last session, one slot per persisted record.
    ///
    /// An invalid record reads as `None` so later slots keep their index.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn questions(&self) -> Result<Vec<Option<Question>>, StorageError> {
        Ok(self
            .question_records()
            .await?
            .into_iter()
            .map(|record| record.into_question().ok())
            .collect())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn answers(&self) -> Result<Vec<Answer>, StorageError> {
        Ok(self.read_json(keys::ANSWERS).await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn time_spent(&self) -> Result<Vec<u64>, StorageError> {
        Ok(self.read_json(keys::TIME_SPENT).await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn score(&self) -> Result<u32, StorageError> {
        Ok(self.read_json(keys::SCORE).await?.unwrap_or(0))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn total_questions(&self) -> Result<u32, StorageError> {
        Ok(self.read_json(keys::TOTAL_QUESTIONS).await?.unwrap_or(0))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn auto_submitted(&self) -> Result<bool, StorageError> {
        Ok(self.read_json(keys::AUTO_SUBMITTED).await?.unwrap_or(false))
    }

    /// Remove everything the last session wrote. The configured count stays.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any key cannot be removed.
    pub async fn clear_results(&self) -> Result<(), StorageError> {
        for key in keys::RESULT_KEYS {
            self.store.remove(key).await?;
        }
        Ok(())
    }

    //
    // ─── HELPERS ────────────────────────────────────────────────────────────
    //

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, %err, "ignoring malformed persisted value");
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(key, &raw).await
    }
}
