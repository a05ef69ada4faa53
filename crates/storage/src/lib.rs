#![forbid(unsafe_code)]

pub mod gateway;
pub mod json_bank;
pub mod repository;
pub mod sqlite;

pub use gateway::PersistenceGateway;
pub use repository::{InMemoryQuestionBank, InMemoryStore, Storage, StorageError};
