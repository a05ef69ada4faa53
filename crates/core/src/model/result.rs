use crate::model::{Answer, Question};

/// Correct / incorrect / unanswered counts for a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultBreakdown {
    pub correct: u32,
    pub incorrect: u32,
    pub unanswered: u32,
}

impl ResultBreakdown {
    /// Recompute the breakdown from persisted answers and questions.
    ///
    /// An answer without a matching question counts as incorrect; questions
    /// without an answer are not counted. `None` slots stand for questions
    /// that could not be read back.
    #[must_use]
    pub fn from_answers(answers: &[Answer], questions: &[Option<Question>]) -> Self {
        let mut breakdown = Self::default();
        for (index, answer) in answers.iter().enumerate() {
            match (answer.key(), questions.get(index).and_then(Option::as_ref)) {
                (None, _) => breakdown.unanswered = breakdown.unanswered.saturating_add(1),
                (Some(key), Some(question)) if key == question.correct() => {
                    breakdown.correct = breakdown.correct.saturating_add(1);
                }
                (Some(_), _) => breakdown.incorrect = breakdown.incorrect.saturating_add(1),
            }
        }
        breakdown
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct
            .saturating_add(self.incorrect)
            .saturating_add(self.unanswered)
    }
}

/// Coarse feedback tier for a score percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBand {
    Perfect,
    Excellent,
    Good,
    NeedsPractice,
}

impl PerformanceBand {
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            Self::Perfect
        } else if percentage >= 80.0 {
            Self::Excellent
        } else if percentage >= 50.0 {
            Self::Good
        } else {
            Self::NeedsPractice
        }
    }
}

/// Score as a percentage of `total`; zero when there were no questions.
#[must_use]
pub fn percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(total) * 100.0
}
