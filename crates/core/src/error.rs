use thiserror::Error;

use crate::ledger::LedgerError;
use crate::model::{QuestionCountError, QuestionError, SessionResultError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuestionCount(#[from] QuestionCountError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Result(#[from] SessionResultError),
}
