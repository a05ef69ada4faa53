mod controller;
mod draw;
mod ports;
mod progress;
mod runner;
mod view;

// Public API of the session subsystem.
pub use crate::error::{LoadFailure, SessionError};
pub use controller::{Completion, QuizSessionController};
pub use draw::QuestionDraw;
pub use ports::{Navigator, TracingNotifier, ViolationNotifier};
pub use progress::SessionProgress;
pub use runner::{SessionCommand, SessionHandle, SessionRunner, SessionSnapshot};
pub use view::{AnswerStatus, ResultService, ResultView, TimeSpentPoint, TimeSpentSummary};
