use quiz_core::model::{Answer, PerformanceBand, Question, ResultBreakdown, percentage};
use storage::PersistenceGateway;
use tracing::info;

use crate::error::SessionError;

/// How one question ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    Unanswered,
}

impl AnswerStatus {
    fn of(answer: Answer, question: Option<&Question>) -> Self {
        match (answer.key(), question) {
            (None, _) => AnswerStatus::Unanswered,
            (Some(key), Some(question)) if key == question.correct() => AnswerStatus::Correct,
            (Some(_), _) => AnswerStatus::Incorrect,
        }
    }
}

/// Time spent on one question, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpentPoint {
    pub question: usize,
    pub seconds: u64,
    pub status: AnswerStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeSpentSummary {
    pub total_secs: u64,
    pub average_secs: f64,
    /// The question that took longest; the earliest wins a tie.
    pub slowest: Option<TimeSpentPoint>,
}

impl TimeSpentSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_points(points: &[TimeSpentPoint]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let total_secs = points.iter().map(|p| p.seconds).sum::<u64>();
        let slowest = points
            .iter()
            .copied()
            .reduce(|best, p| if p.seconds > best.seconds { p } else { best });
        Self {
            total_secs,
            average_secs: total_secs as f64 / points.len() as f64,
            slowest,
        }
    }
}

/// Presentation-agnostic view of the last persisted session.
///
/// No pre-formatted strings; the UI decides how to render scores and times.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub score: u32,
    pub total_questions: u32,
    pub breakdown: ResultBreakdown,
    pub percentage: f64,
    pub band: PerformanceBand,
    pub auto_submitted: bool,
    pub time_spent: Vec<TimeSpentPoint>,
    pub timing: TimeSpentSummary,
}

impl ResultView {
    #[must_use]
    pub fn has_result(&self) -> bool {
        self.total_questions > 0
    }
}

/// Read side of a finished session, backed only by persisted keys.
#[derive(Clone)]
pub struct ResultService {
    gateway: PersistenceGateway,
}

impl ResultService {
    #[must_use]
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Rebuild the result view from storage.
    ///
    /// Missing keys read as an empty result rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on store failures.
    pub async fn load(&self) -> Result<ResultView, SessionError> {
        let score = self.gateway.score().await?;
        let total_questions = self.gateway.total_questions().await?;
        let auto_submitted = self.gateway.auto_submitted().await?;
        let answers = self.gateway.answers().await?;
        let questions = self.gateway.questions().await?;
        let times = self.gateway.time_spent().await?;

        let breakdown = ResultBreakdown::from_answers(&answers, &questions);
        let percentage = percentage(score, total_questions);

        let time_spent: Vec<TimeSpentPoint> = times
            .iter()
            .enumerate()
            .map(|(index, &seconds)| TimeSpentPoint {
                question: index + 1,
                seconds,
                status: AnswerStatus::of(
                    answers.get(index).copied().unwrap_or_default(),
                    questions.get(index).and_then(Option::as_ref),
                ),
            })
            .collect();
        let timing = TimeSpentSummary::from_points(&time_spent);

        Ok(ResultView {
            score,
            total_questions,
            breakdown,
            percentage,
            band: PerformanceBand::from_percentage(percentage),
            auto_submitted,
            time_spent,
            timing,
        })
    }

    /// Remove the persisted session. The configured question count stays.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on store failures.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.gateway.clear_results().await?;
        info!("cleared persisted quiz results");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::ledger::LedgerTally;
    use quiz_core::model::{AnswerKey, QuestionSet, SessionResult};
    use quiz_core::time::fixed_now;
    use std::sync::Arc;
    use storage::InMemoryStore;
    use storage::gateway::keys;
    use storage::repository::KeyValueStore;

    fn question(correct: AnswerKey) -> Question {
        Question::new(
            "Q",
            ["1".into(), "2".into(), "3".into(), "4".into()],
            correct,
        )
        .unwrap()
    }

    async fn seeded_service() -> ResultService {
        let gateway = PersistenceGateway::new(Arc::new(InMemoryStore::new()));
        let questions =
            QuestionSet::new(vec![question(AnswerKey::A), question(AnswerKey::B), question(AnswerKey::C)])
                .unwrap();
        gateway.save_question_set(&questions).await.unwrap();
        let result = SessionResult::from_tally(
            LedgerTally {
                score: 1,
                answers: vec![
                    Answer::Selected(AnswerKey::A),
                    Answer::Unanswered,
                    Answer::Selected(AnswerKey::D),
                ],
                time_spent: vec![4, 12, 12],
            },
            false,
            fixed_now(),
        )
        .unwrap();
        gateway.save_result(&result).await.unwrap();
        ResultService::new(gateway)
    }

    #[tokio::test]
    async fn view_breakdown_matches_persisted_answers() {
        let view = seeded_service().await.load().await.unwrap();

        assert_eq!(view.score, 1);
        assert_eq!(view.total_questions, 3);
        assert_eq!(
            view.breakdown,
            ResultBreakdown {
                correct: 1,
                incorrect: 1,
                unanswered: 1
            }
        );
        assert_eq!(view.band, PerformanceBand::NeedsPractice);
        assert!(!view.auto_submitted);
        assert_eq!(
            view.time_spent.iter().map(|p| p.status).collect::<Vec<_>>(),
            vec![
                AnswerStatus::Correct,
                AnswerStatus::Unanswered,
                AnswerStatus::Incorrect
            ]
        );
    }

    #[tokio::test]
    async fn timing_summary_picks_earliest_slowest() {
        let view = seeded_service().await.load().await.unwrap();
        assert_eq!(view.timing.total_secs, 28);
        assert_eq!(view.timing.slowest.map(|p| p.question), Some(2));
    }

    #[tokio::test]
    async fn invalid_persisted_question_keeps_later_answers_aligned() {
        let store = InMemoryStore::new();
        store
            .set(
                keys::QUESTIONS,
                r#"[{"question":" ","A":"1","B":"2","C":"3","D":"4","answer":"A"},
                    {"question":"Q2","A":"1","B":"2","C":"3","D":"4","answer":"B"}]"#,
            )
            .await
            .unwrap();
        store.set(keys::ANSWERS, r#"["A","B"]"#).await.unwrap();
        store.set(keys::TIME_SPENT, "[3,4]").await.unwrap();
        let service = ResultService::new(PersistenceGateway::new(Arc::new(store)));

        let view = service.load().await.unwrap();
        assert_eq!(
            view.breakdown,
            ResultBreakdown {
                correct: 1,
                incorrect: 1,
                unanswered: 0
            }
        );
        assert_eq!(view.time_spent[1].status, AnswerStatus::Correct);
    }

    #[tokio::test]
    async fn clear_leaves_an_empty_view() {
        let service = seeded_service().await;
        service.clear().await.unwrap();

        let view = service.load().await.unwrap();
        assert!(!view.has_result());
        assert!(view.time_spent.is_empty());
        assert!(view.percentage.abs() < f64::EPSILON);
        assert_eq!(view.timing, TimeSpentSummary::default());
    }
}
