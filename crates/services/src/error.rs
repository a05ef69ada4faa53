//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::ledger::LedgerError;
use quiz_core::model::{QuestionCountError, SessionResultError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Why a session could not leave `Loading`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadFailure {
    #[error("question bank unreachable: {0}")]
    Unreachable(String),
    #[error("question bank is malformed: {0}")]
    Malformed(String),
    #[error("question bank is empty")]
    Empty,
}

/// Errors emitted by `QuizSessionController` and `SessionRunner`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadFailure),
    #[error("session has not started")]
    NotStarted,
    #[error("session is no longer in progress")]
    NotInProgress,
    #[error("finish is only available on the last question ({index} of {last})")]
    NotOnLastQuestion { index: usize, last: usize },
    #[error("session has no result to persist")]
    NoResult,
    #[error("session runner has shut down")]
    RunnerClosed,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Result(#[from] SessionResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// True when the error only rejects a single user action and the
    /// session can carry on.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::NotOnLastQuestion { .. }
                | SessionError::NotInProgress
                | SessionError::Ledger(_)
        )
    }
}

/// Errors emitted by `QuizSetupService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetupError {
    #[error(transparent)]
    OutOfRange(#[from] QuestionCountError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `HttpQuestionBank`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank url is not configured")]
    Disabled,
    #[error("question bank request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl From<BankError> for StorageError {
    fn from(err: BankError) -> Self {
        match err {
            BankError::HttpStatus(status) if status == reqwest::StatusCode::NOT_FOUND => {
                StorageError::NotFound
            }
            BankError::Http(err) if err.is_decode() => StorageError::Serialization(err.to_string()),
            other => StorageError::Connection(other.to_string()),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_action_rejections_are_recoverable() {
        assert!(SessionError::NotOnLastQuestion { index: 0, last: 2 }.is_recoverable());
        assert!(SessionError::NotInProgress.is_recoverable());
        assert!(!SessionError::Storage(StorageError::NotFound).is_recoverable());
        assert!(!SessionError::Load(LoadFailure::Empty).is_recoverable());
    }

    #[test]
    fn bank_status_maps_to_storage_error() {
        let err: StorageError = BankError::HttpStatus(reqwest::StatusCode::NOT_FOUND).into();
        assert!(matches!(err, StorageError::NotFound));
        let err: StorageError = BankError::Disabled.into();
        assert!(matches!(err, StorageError::Connection(_)));
    }
}
