use std::sync::Arc;

use storage::PersistenceGateway;
use storage::repository::{QuestionBankSource, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::{Navigator, QuizSessionController, ResultService};
use crate::setup::QuizSetupService;

/// Assembles app-facing services over one key/value store and one bank.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    seed: Option<u64>,
    gateway: PersistenceGateway,
    bank: Arc<dyn QuestionBankSource>,
    setup: Arc<QuizSetupService>,
    results: Arc<ResultService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        bank: Arc<dyn QuestionBankSource>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, bank))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, bank: Arc<dyn QuestionBankSource>) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, bank)
    }

    fn from_storage(storage: &Storage, clock: Clock, bank: Arc<dyn QuestionBankSource>) -> Self {
        let gateway = PersistenceGateway::new(Arc::clone(&storage.store));
        Self {
            clock,
            seed: None,
            setup: Arc::new(QuizSetupService::new(gateway.clone())),
            results: Arc::new(ResultService::new(gateway.clone())),
            gateway,
            bank,
        }
    }

    /// Draw questions deterministically in every session built from here on.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    #[must_use]
    pub fn setup(&self) -> Arc<QuizSetupService> {
        Arc::clone(&self.setup)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultService> {
        Arc::clone(&self.results)
    }

    /// A fresh controller in `Loading`, wired to this app's bank and store.
    #[must_use]
    pub fn new_session(&self, navigator: Arc<dyn Navigator>) -> QuizSessionController {
        let controller = QuizSessionController::new(
            Arc::clone(&self.bank),
            self.gateway.clone(),
            navigator,
        )
        .with_clock(self.clock);
        match self.seed {
            Some(seed) => controller.with_seed(seed),
            None => controller,
        }
    }
}
