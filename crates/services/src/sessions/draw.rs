use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rng};

use quiz_core::model::Question;

/// Picks a random subset of the bank without replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionDraw {
    seed: Option<u64>,
}

impl QuestionDraw {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed seed so the same bank always yields the same draw.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Shuffle `questions` and keep the first `count`.
    ///
    /// Asking for more than the bank holds returns the whole bank, shuffled.
    #[must_use]
    pub fn draw(&self, mut questions: Vec<Question>, count: usize) -> Vec<Question> {
        match self.seed {
            Some(seed) => questions.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => questions.shuffle(&mut rng()),
        }
        questions.truncate(count);
        questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::AnswerKey;
    use std::collections::HashSet;

    fn bank(len: usize) -> Vec<Question> {
        (0..len)
            .map(|i| {
                Question::new(
                    format!("Question {i}"),
                    ["a".into(), "b".into(), "c".into(), "d".into()],
                    AnswerKey::A,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn draw_has_no_duplicates() {
        let drawn = QuestionDraw::new().draw(bank(25), 10);
        assert_eq!(drawn.len(), 10);
        let texts: HashSet<_> = drawn.iter().map(|q| q.text().to_owned()).collect();
        assert_eq!(texts.len(), 10);
    }

    #[test]
    fn draw_never_exceeds_bank() {
        let drawn = QuestionDraw::new().draw(bank(4), 10);
        assert_eq!(drawn.len(), 4);
    }

    #[test]
    fn seeded_draws_repeat() {
        let draw = QuestionDraw::new().with_seed(7);
        assert_eq!(draw.draw(bank(30), 10), draw.draw(bank(30), 10));
    }
}
