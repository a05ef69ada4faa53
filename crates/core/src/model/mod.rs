mod answer;
mod ids;
mod question;
mod question_count;
mod result;
mod session;

pub use answer::{Answer, UNANSWERED};
pub use ids::SessionId;
pub use question::{AnswerKey, AnswerKeyError, Question, QuestionError, QuestionSet};
pub use question_count::{QuestionCount, QuestionCountError, SECONDS_PER_QUESTION};
pub use result::{PerformanceBand, ResultBreakdown, percentage};
pub use session::{SessionResult, SessionResultError, SessionState};
