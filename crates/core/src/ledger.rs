//! Per-question answer and timing records for one session.

use thiserror::Error;

use crate::model::{Answer, AnswerKey, QuestionSet};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("question index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Answers and time spent, one slot per drawn question.
///
/// Both vectors always have the length of the session's question set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    answers: Vec<Answer>,
    time_spent: Vec<u64>,
}

/// Output of `AnswerLedger::finalize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTally {
    pub score: u32,
    pub answers: Vec<Answer>,
    pub time_spent: Vec<u64>,
}

impl AnswerLedger {
    /// Fresh ledger with every question unanswered and untimed.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            answers: vec![Answer::Unanswered; len],
            time_spent: vec![0; len],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn time_spent(&self) -> &[u64] {
        &self.time_spent
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<Answer> {
        self.answers.get(index).copied()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }

    /// Overwrite the selection for `index`. Correctness is not checked here.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::IndexOutOfRange` for an index past the end.
    pub fn select_answer(&mut self, index: usize, key: AnswerKey) -> Result<(), LedgerError> {
        *self.answer_slot(index)? = Answer::Selected(key);
        Ok(())
    }

    /// Reset `index` back to unanswered.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::IndexOutOfRange` for an index past the end.
    pub fn clear_answer(&mut self, index: usize) -> Result<(), LedgerError> {
        *self.answer_slot(index)? = Answer::Unanswered;
        Ok(())
    }

    /// Store the time spent on the latest visit to `index`.
    ///
    /// Last write wins; revisits replace rather than accumulate.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::IndexOutOfRange` for an index past the end.
    pub fn record_elapsed(&mut self, index: usize, seconds: u64) -> Result<(), LedgerError> {
        let len = self.time_spent.len();
        let slot = self
            .time_spent
            .get_mut(index)
            .ok_or(LedgerError::IndexOutOfRange { index, len })?;
        *slot = seconds;
        Ok(())
    }

    /// Score the ledger against the session's questions.
    ///
    /// One point per answer equal to the question's correct key; unanswered and
    /// mismatched entries score nothing.
    #[must_use]
    pub fn finalize(&self, questions: &QuestionSet) -> LedgerTally {
        let score = self
            .answers
            .iter()
            .zip(questions)
            .filter(|(answer, question)| answer.matches(question.correct()))
            .fold(0_u32, |acc, _| acc.saturating_add(1));

        LedgerTally {
            score,
            answers: self.answers.clone(),
            time_spent: self.time_spent.clone(),
        }
    }

    fn answer_slot(&mut self, index: usize) -> Result<&mut Answer, LedgerError> {
        let len = self.answers.len();
        self.answers
            .get_mut(index)
            .ok_or(LedgerError::IndexOutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;

    fn questions(keys: &[AnswerKey]) -> QuestionSet {
        let questions = keys
            .iter()
            .map(|key| {
                Question::new(
                    "Q",
                    ["a".into(), "b".into(), "c".into(), "d".into()],
                    *key,
                )
                .unwrap()
            })
            .collect();
        QuestionSet::new(questions).unwrap()
    }

    #[test]
    fn finalize_scores_exact_matches_only() {
        let set = questions(&[AnswerKey::A, AnswerKey::B, AnswerKey::C]);
        let mut ledger = AnswerLedger::new(set.len());
        ledger.select_answer(0, AnswerKey::A).unwrap();
        ledger.select_answer(2, AnswerKey::D).unwrap();

        let tally = ledger.finalize(&set);
        assert_eq!(tally.score, 1);
        assert_eq!(
            tally.answers,
            vec![
                Answer::Selected(AnswerKey::A),
                Answer::Unanswered,
                Answer::Selected(AnswerKey::D)
            ]
        );
    }

    #[test]
    fn select_overwrites_previous_choice() {
        let set = questions(&[AnswerKey::B]);
        let mut ledger = AnswerLedger::new(1);
        ledger.select_answer(0, AnswerKey::A).unwrap();
        ledger.select_answer(0, AnswerKey::B).unwrap();
        assert_eq!(ledger.finalize(&set).score, 1);

        ledger.clear_answer(0).unwrap();
        assert_eq!(ledger.answered_count(), 0);
    }

    #[test]
    fn record_elapsed_keeps_latest_visit() {
        let mut ledger = AnswerLedger::new(2);
        ledger.record_elapsed(0, 12).unwrap();
        ledger.record_elapsed(0, 3).unwrap();
        assert_eq!(ledger.time_spent(), &[3, 0]);
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let mut ledger = AnswerLedger::new(2);
        assert_eq!(
            ledger.select_answer(2, AnswerKey::A).unwrap_err(),
            LedgerError::IndexOutOfRange { index: 2, len: 2 }
        );
        assert!(ledger.record_elapsed(5, 1).is_err());
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.time_spent().len(), 2);
    }
}
