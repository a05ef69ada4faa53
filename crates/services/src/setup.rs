use quiz_core::model::QuestionCount;
use storage::PersistenceGateway;
use tracing::{info, warn};

use crate::error::SetupError;

/// Pre-session configuration: how many questions the next attempt draws.
#[derive(Clone)]
pub struct QuizSetupService {
    gateway: PersistenceGateway,
}

impl QuizSetupService {
    #[must_use]
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Counts the participant may choose from.
    #[must_use]
    pub fn options(&self) -> &'static [u32] {
        &QuestionCount::ALLOWED
    }

    /// The stored count when valid, otherwise the default.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::Storage` if the store cannot be read.
    pub async fn selected_count(&self) -> Result<QuestionCount, SetupError> {
        let count = match self.gateway.configured_count().await? {
            Some(raw) => QuestionCount::new(raw).unwrap_or_else(|err| {
                warn!(%err, "stored question count is not selectable");
                QuestionCount::DEFAULT
            }),
            None => QuestionCount::DEFAULT,
        };
        Ok(count)
    }

    /// Validate and store the count for the next attempt.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::OutOfRange` for counts outside the allowed set and
    /// `SetupError::Storage` if the value cannot be stored.
    pub async fn select_count(&self, raw: u32) -> Result<QuestionCount, SetupError> {
        let count = QuestionCount::new(raw)?;
        self.gateway.set_question_count(count).await?;
        info!(count = count.get(), "question count configured");
        Ok(count)
    }
}
