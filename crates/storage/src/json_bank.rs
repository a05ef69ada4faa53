use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::repository::{QuestionBankSource, QuestionRecord, StorageError};

/// Question bank read from a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileQuestionBank {
    path: PathBuf,
}

impl JsonFileQuestionBank {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuestionBankSource for JsonFileQuestionBank {
    async fn fetch_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => StorageError::NotFound,
                _ => StorageError::Connection(err.to_string()),
            })?;
        serde_json::from_str(&raw).map_err(|err| StorageError::Serialization(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quiz-bank-{}-{name}.json", std::process::id()))
    }

    #[tokio::test]
    async fn reads_bank_document() {
        let path = temp_path("ok");
        tokio::fs::write(
            &path,
            r#"[{"question":"2+2?","A":"3","B":"4","C":"5","D":"6","answer":"B"}]"#,
        )
        .await
        .unwrap();

        let records = JsonFileQuestionBank::new(&path).fetch_questions().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer, "B");
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = JsonFileQuestionBank::new(temp_path("missing"))
            .fetch_questions()
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn malformed_document_is_serialization_error() {
        let path = temp_path("bad");
        tokio::fs::write(&path, r#"{"not":"a list"}"#).await.unwrap();
        let err = JsonFileQuestionBank::new(&path).fetch_questions().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
