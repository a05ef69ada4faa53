use std::env;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use storage::repository::{QuestionBankSource, QuestionRecord, StorageError};

use crate::error::BankError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpBankConfig {
    pub url: String,
}

impl HttpBankConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = env::var("QUIZ_BANK_URL").ok()?;
        if url.trim().is_empty() {
            return None;
        }
        Some(Self { url })
    }
}

/// Question bank served as a JSON document over HTTP.
#[derive(Clone)]
pub struct HttpQuestionBank {
    client: Client,
    config: Option<HttpBankConfig>,
}

impl HttpQuestionBank {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(HttpBankConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<HttpBankConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Download the bank document.
    ///
    /// # Errors
    ///
    /// Returns `BankError` when no url is configured, the request fails, or
    /// the body is not a list of question records.
    pub async fn download(&self) -> Result<Vec<QuestionRecord>, BankError> {
        let config = self.config.as_ref().ok_or(BankError::Disabled)?;

        let response = self.client.get(&config.url).send().await?;
        if !response.status().is_success() {
            return Err(BankError::HttpStatus(response.status()));
        }

        let records: Vec<QuestionRecord> = response.json().await?;
        debug!(url = %config.url, count = records.len(), "question bank downloaded");
        Ok(records)
    }
}

#[async_trait]
impl QuestionBankSource for HttpQuestionBank {
    async fn fetch_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        Ok(self.download().await?)
    }
}
