#![forbid(unsafe_code)]

pub mod app_services;
pub mod bank;
pub mod error;
pub mod sessions;
pub mod setup;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use bank::{HttpBankConfig, HttpQuestionBank};
pub use error::{AppServicesError, BankError, LoadFailure, SessionError, SetupError};
pub use setup::QuizSetupService;

pub use sessions::{
    Completion, Navigator, QuizSessionController, ResultService, ResultView, SessionCommand,
    SessionHandle, SessionRunner, SessionSnapshot, ViolationNotifier,
};
