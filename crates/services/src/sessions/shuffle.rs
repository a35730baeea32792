use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rng};

use quiz_core::model::Question;

/// Reorders a session's questions in place.
///
/// Sessions call this on their own copy of the question list, so the quiz
/// definition keeps its authored order.
pub trait QuestionShuffler: Send + Sync {
    fn shuffle(&self, questions: &mut [Question]);
}

/// Draws from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomShuffler;

impl QuestionShuffler for RandomShuffler {
    fn shuffle(&self, questions: &mut [Question]) {
        let mut rng = rng();
        questions.shuffle(&mut rng);
    }
}

/// Reproducible shuffling from a fixed seed.
///
/// Successive draws differ, but the whole sequence of draws is the same for
/// every shuffler built from the same seed.
#[derive(Debug)]
pub struct SeededShuffler {
    rng: Mutex<StdRng>,
}

impl SeededShuffler {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl QuestionShuffler for SeededShuffler {
    fn shuffle(&self, questions: &mut [Question]) {
        let mut guard = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        questions.shuffle(&mut *guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;

    fn questions(n: u64) -> Vec<Question> {
        (1..=n)
            .map(|id| {
                Question::single_choice(
                    QuestionId::new(id),
                    format!("Q{id}"),
                    vec!["a".into(), "b".into()],
                    0,
                    None,
                )
                .unwrap()
            })
            .collect()
    }

    fn ids(questions: &[Question]) -> Vec<u64> {
        questions.iter().map(|q| q.id().value()).collect()
    }

    #[test]
    fn seeded_shuffler_is_reproducible() {
        let mut a = questions(12);
        let mut b = questions(12);
        SeededShuffler::new(7).shuffle(&mut a);
        SeededShuffler::new(7).shuffle(&mut b);
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn shuffling_keeps_every_question() {
        let mut shuffled = questions(12);
        RandomShuffler.shuffle(&mut shuffled);
        let mut sorted = ids(&shuffled);
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=12).collect::<Vec<_>>());
    }
}
