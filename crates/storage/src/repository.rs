use async_trait::async_trait;
use quiz_core::model::{AnswerKey, Question, QuestionError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a question in the bank document.
///
/// Field names follow the bank format: `question`, one field per option key,
/// and `answer` for the correct key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
    pub answer: String,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            question: question.text().to_owned(),
            a: question.option(AnswerKey::A).to_owned(),
            b: question.option(AnswerKey::B).to_owned(),
            c: question.option(AnswerKey::C).to_owned(),
            d: question.option(AnswerKey::D).to_owned(),
            answer: question.correct().as_str().to_owned(),
        }
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the answer key is unknown or any text is blank.
    pub fn into_question(self) -> Result<Question, QuestionError> {
        let correct = self.answer.parse::<AnswerKey>()?;
        Question::new(self.question, [self.a, self.b, self.c, self.d], correct)
    }
}

/// String-keyed store holding JSON-encoded values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Source of the full question bank, requested once per session.
#[async_trait]
pub trait QuestionBankSource: Send + Sync {
    /// Fetch every question record in bank order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the bank is unreachable or unreadable.
    async fn fetch_questions(&self) -> Result<Vec<QuestionRecord>, StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.clear();
        Ok(())
    }
}

/// Fixed question bank held in memory.
#[derive(Clone, Default)]
pub struct InMemoryQuestionBank {
    records: Arc<Vec<QuestionRecord>>,
}

impl InMemoryQuestionBank {
    #[must_use]
    pub fn new(records: Vec<QuestionRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }
}

#[async_trait]
impl QuestionBankSource for InMemoryQuestionBank {
    async fn fetch_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        Ok(self.records.as_ref().clone())
    }
}

/// Key/value backend behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub store: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        Self { store }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(answer: &str) -> QuestionRecord {
        QuestionRecord {
            question: "Capital of France?".into(),
            a: "Paris".into(),
            b: "Rome".into(),
            c: "Madrid".into(),
            d: "Berlin".into(),
            answer: answer.into(),
        }
    }

    #[test]
    fn record_round_trips_through_question() {
        let question = record("A").into_question().unwrap();
        assert_eq!(question.correct(), AnswerKey::A);
        assert_eq!(QuestionRecord::from_question(&question), record("A"));
    }

    #[test]
    fn record_with_unknown_key_is_rejected() {
        assert!(matches!(
            record("E").into_question(),
            Err(QuestionError::InvalidKey(_))
        ));
    }

    #[test]
    fn record_reads_bank_field_names() {
        let json = r#"{"question":"Q","A":"1","B":"2","C":"3","D":"4","answer":"C"}"#;
        let parsed: QuestionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.c, "3");
        assert_eq!(parsed.into_question().unwrap().correct(), AnswerKey::C);
    }

    #[tokio::test]
    async fn in_memory_store_supports_get_set_remove_clear() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "1").await.unwrap();
        store.set("j", "2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("1"));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.clear().await.unwrap();
        assert_eq!(store.len().unwrap(), 0);
    }

    #[tokio::test]
    async fn in_memory_bank_returns_records() {
        let bank = InMemoryQuestionBank::new(vec![record("B")]);
        let fetched = bank.fetch_questions().await.unwrap();
        assert_eq!(fetched, vec![record("B")]);
    }
}
