use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use quiz_core::model::{Answer, Question, QuestionId, QuestionKind, Quiz, QuizResult, Response};
use quiz_core::scoring::score_responses;

use super::progress::SessionProgress;
use super::shuffle::QuestionShuffler;
use super::sink::ResultSink;
use crate::error::{Restriction, SessionError};

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a started session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    InProgress,
    Completed,
    Reviewing,
}

impl SessionMode {
    fn restriction(self) -> Restriction {
        match self {
            SessionMode::InProgress => Restriction::InProgress,
            SessionMode::Completed => Restriction::Completed,
            SessionMode::Reviewing => Restriction::Reviewing,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a quiz.
///
/// Holds the session-local question order, one optional `Response` per question
/// and, once scored, the immutable result. Every rejected operation leaves the
/// session exactly as it was.
pub struct QuizSession {
    quiz: Arc<Quiz>,
    shuffler: Arc<dyn QuestionShuffler>,
    sink: Arc<dyn ResultSink>,
    questions: Vec<Question>,
    active: usize,
    responses: HashMap<QuestionId, Response>,
    started_at: DateTime<Utc>,
    mode: SessionMode,
    result: Option<QuizResult>,
    attempt: u32,
}

impl QuizSession {
    /// Start a session for `quiz`.
    ///
    /// When the quiz asks for shuffling, the session draws its own order from
    /// `shuffler`; the quiz itself is never reordered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidQuiz` if the quiz has no questions or a
    /// question is malformed.
    pub fn start(
        quiz: Arc<Quiz>,
        shuffler: Arc<dyn QuestionShuffler>,
        sink: Arc<dyn ResultSink>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        quiz.validate()?;
        let questions = session_order(&quiz, shuffler.as_ref());
        tracing::debug!(quiz_id = %quiz.id(), questions = questions.len(), "session started");

        Ok(Self {
            quiz,
            shuffler,
            sink,
            questions,
            active: 0,
            responses: HashMap::new(),
            started_at,
            mode: SessionMode::InProgress,
            result: None,
            attempt: 1,
        })
    }

    // ─── queries ───────────────────────────────────────────────────────────────

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// Questions in session order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn active_question(&self) -> &Question {
        &self.questions[self.active]
    }

    #[must_use]
    pub fn response(&self, id: QuestionId) -> Option<&Response> {
        self.responses.get(&id)
    }

    /// The recorded answer for a question, if it was answered rather than skipped.
    #[must_use]
    pub fn answer(&self, id: QuestionId) -> Option<&Answer> {
        self.responses.get(&id).and_then(Response::answer)
    }

    #[must_use]
    pub fn is_skipped(&self, id: QuestionId) -> bool {
        self.responses.get(&id).is_some_and(Response::is_skipped)
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.mode != SessionMode::InProgress
    }

    #[must_use]
    pub fn is_reviewing(&self) -> bool {
        self.mode == SessionMode::Reviewing
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    /// 1 for the first attempt, incremented by every restart.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// True when every question has an answer or a skip.
    #[must_use]
    pub fn can_finish(&self) -> bool {
        self.unresolved() == 0
    }

    fn unresolved(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| !self.responses.contains_key(&q.id()))
            .count()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let skipped = self.responses.values().filter(|r| r.is_skipped()).count();
        let answered = self.responses.len() - skipped;
        let total = self.questions.len();
        SessionProgress {
            total,
            answered,
            skipped,
            remaining: total.saturating_sub(answered + skipped),
            position: self.active + 1,
            is_complete: self.is_completed(),
        }
    }

    // ─── mutations ─────────────────────────────────────────────────────────────

    /// Record `answer` for a question, replacing any earlier answer or skip.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForMode` once completed, `UnknownQuestion` for ids outside
    /// the quiz, `InvalidAnswer` if the answer's shape or indices do not fit.
    pub fn select_answer(&mut self, id: QuestionId, answer: Answer) -> Result<(), SessionError> {
        self.ensure_mutable("select_answer")?;
        let question = self.question(id)?;
        if !answer.fits(question) {
            return Err(SessionError::InvalidAnswer(id));
        }
        self.responses.insert(id, Response::Answered(answer));
        Ok(())
    }

    /// Flip one option of a multiple-choice answer.
    ///
    /// Starting from a skip or from no answer, the option becomes the only one
    /// checked. Unchecking the last option leaves an empty answer, not a skip.
    ///
    /// # Errors
    ///
    /// As [`QuizSession::select_answer`], plus `InvalidOperationForMode` for
    /// single-choice questions.
    pub fn toggle_option(&mut self, id: QuestionId, option: usize) -> Result<(), SessionError> {
        self.ensure_mutable("toggle_option")?;
        let question = self.question(id)?;
        if question.kind() == QuestionKind::SingleChoice {
            return Err(SessionError::InvalidOperationForMode {
                operation: "toggle_option",
                restriction: Restriction::SingleChoice(id),
            });
        }
        if option >= question.option_count() {
            return Err(SessionError::InvalidAnswer(id));
        }

        let mut selected: BTreeSet<usize> = match self.responses.get(&id) {
            Some(Response::Answered(Answer::Multiple(set))) => set.clone(),
            _ => BTreeSet::new(),
        };
        if !selected.remove(&option) {
            selected.insert(option);
        }
        self.responses
            .insert(id, Response::Answered(Answer::Multiple(selected)));
        Ok(())
    }

    /// Mark a question skipped, dropping any recorded answer.
    ///
    /// Unless the skipped question is the last one, the active index then moves
    /// forward by one from wherever it is, clamped to the last question.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForMode` once completed, `UnknownQuestion` for ids outside the quiz.
    pub fn skip(&mut self, id: QuestionId) -> Result<(), SessionError> {
        self.ensure_mutable("skip")?;
        let position = self.position(id)?;
        self.responses.insert(id, Response::Skipped);
        let last = self.questions.len() - 1;
        if position < last {
            self.active = (self.active + 1).min(last);
        }
        Ok(())
    }

    /// Move to the next question. Returns false at the last question.
    pub fn advance(&mut self) -> bool {
        if self.active + 1 < self.questions.len() {
            self.active += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous question. Returns false at the first question.
    pub fn retreat(&mut self) -> bool {
        if self.active > 0 {
            self.active -= 1;
            true
        } else {
            false
        }
    }

    /// Score the session and hand the result to the sink.
    ///
    /// # Errors
    ///
    /// `AlreadyCompleted` if a result exists, `IncompleteQuiz` while any question
    /// is neither answered nor skipped.
    pub fn finish(&mut self, completed_at: DateTime<Utc>) -> Result<&QuizResult, SessionError> {
        if self.is_completed() {
            return Err(SessionError::AlreadyCompleted);
        }
        let unresolved = self.unresolved();
        if unresolved > 0 {
            return Err(SessionError::IncompleteQuiz { unresolved });
        }
        self.complete(completed_at)
    }

    /// Score the session because its time ran out.
    ///
    /// Questions without an answer or skip are scored as skipped.
    ///
    /// # Errors
    ///
    /// `AlreadyCompleted` if a result exists; the session is left untouched.
    pub fn expire_by_timer(&mut self, now: DateTime<Utc>) -> Result<&QuizResult, SessionError> {
        if self.is_completed() {
            return Err(SessionError::AlreadyCompleted);
        }
        tracing::info!(
            quiz_id = %self.quiz.id(),
            attempt = self.attempt,
            unresolved = self.unresolved(),
            "session expired"
        );
        self.complete(now)
    }

    fn complete(&mut self, completed_at: DateTime<Utc>) -> Result<&QuizResult, SessionError> {
        let result = score_responses(
            self.quiz.id(),
            &self.questions,
            &self.responses,
            self.started_at,
            completed_at,
        )?;
        tracing::info!(
            quiz_id = %result.quiz_id(),
            attempt = self.attempt,
            score = result.score(),
            total = result.total_questions(),
            skipped = result.skipped_count(),
            "session completed"
        );
        self.sink.record(result.clone());
        self.mode = SessionMode::Completed;
        Ok(&*self.result.insert(result))
    }

    /// Switch a completed session to read-only review, back at the first question.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForMode` unless the session is `Completed`; review is
    /// not re-entered while already reviewing.
    pub fn enter_review(&mut self) -> Result<(), SessionError> {
        if self.mode != SessionMode::Completed {
            return Err(SessionError::InvalidOperationForMode {
                operation: "enter_review",
                restriction: self.mode.restriction(),
            });
        }
        self.mode = SessionMode::Reviewing;
        self.active = 0;
        tracing::debug!(quiz_id = %self.quiz.id(), attempt = self.attempt, "review started");
        Ok(())
    }

    /// Begin a fresh attempt at the same quiz.
    ///
    /// Draws a new order when the quiz shuffles and clears every response. The
    /// previous result has already been recorded and is not touched.
    ///
    /// # Errors
    ///
    /// `InvalidOperationForMode` while the session is still in progress.
    pub fn restart(&mut self, started_at: DateTime<Utc>) -> Result<(), SessionError> {
        if self.mode == SessionMode::InProgress {
            return Err(SessionError::InvalidOperationForMode {
                operation: "restart",
                restriction: Restriction::InProgress,
            });
        }
        self.questions = session_order(&self.quiz, self.shuffler.as_ref());
        self.active = 0;
        self.responses.clear();
        self.started_at = started_at;
        self.mode = SessionMode::InProgress;
        self.result = None;
        self.attempt += 1;
        tracing::info!(quiz_id = %self.quiz.id(), attempt = self.attempt, "session restarted");
        Ok(())
    }

    // ─── helpers ───────────────────────────────────────────────────────────────

    fn ensure_mutable(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.mode == SessionMode::InProgress {
            Ok(())
        } else {
            Err(SessionError::InvalidOperationForMode {
                operation,
                restriction: self.mode.restriction(),
            })
        }
    }

    fn position(&self, id: QuestionId) -> Result<usize, SessionError> {
        self.questions
            .iter()
            .position(|q| q.id() == id)
            .ok_or(SessionError::UnknownQuestion(id))
    }

    fn question(&self, id: QuestionId) -> Result<&Question, SessionError> {
        self.position(id).map(|i| &self.questions[i])
    }
}

fn session_order(quiz: &Quiz, shuffler: &dyn QuestionShuffler) -> Vec<Question> {
    let mut questions = quiz.questions().to_vec();
    if quiz.shuffle_questions() {
        shuffler.shuffle(&mut questions);
    }
    questions
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.quiz.id())
            .field("questions_len", &self.questions.len())
            .field("active", &self.active)
            .field("responses_len", &self.responses.len())
            .field("started_at", &self.started_at)
            .field("mode", &self.mode)
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::shuffle::SeededShuffler;
    use crate::sessions::sink::MemoryResultSink;
    use chrono::Duration;
    use quiz_core::model::{QuizDraft, QuizId, SubmittedAnswer};
    use quiz_core::time::fixed_now;

    fn single(id: u64, correct: usize) -> Question {
        Question::single_choice(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["a".into(), "b".into(), "c".into()],
            correct,
            None,
        )
        .unwrap()
    }

    fn multi(id: u64, correct: &[usize]) -> Question {
        Question::multiple_choice(
            QuestionId::new(id),
            format!("M{id}"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct.iter().copied(),
            None,
        )
        .unwrap()
    }

    fn quiz(questions: Vec<Question>, shuffle: bool, limit: Option<u32>) -> Arc<Quiz> {
        let draft = QuizDraft {
            title: "Test".into(),
            description: "Session tests".into(),
            time_limit_secs: limit,
            shuffle_questions: shuffle,
            questions,
        };
        Arc::new(draft.validate(fixed_now()).unwrap().assign_id(QuizId::new(1)))
    }

    fn start(quiz: Arc<Quiz>) -> (QuizSession, MemoryResultSink) {
        let sink = MemoryResultSink::new();
        let session = QuizSession::start(
            quiz,
            Arc::new(SeededShuffler::new(1)),
            Arc::new(sink.clone()),
            fixed_now(),
        )
        .unwrap();
        (session, sink)
    }

    fn q(id: u64) -> QuestionId {
        QuestionId::new(id)
    }

    #[test]
    fn start_rejects_quiz_without_questions() {
        let empty = Quiz::from_persisted(
            QuizId::new(9),
            "Empty".into(),
            "nothing".into(),
            None,
            false,
            Vec::new(),
            fixed_now(),
            fixed_now(),
        )
        .unwrap();
        let err = QuizSession::start(
            Arc::new(empty),
            Arc::new(SeededShuffler::new(1)),
            Arc::new(MemoryResultSink::new()),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::InvalidQuiz(_)));
    }

    #[test]
    fn answering_clears_skip_and_skipping_clears_answer() {
        let (mut session, _) = start(quiz(vec![single(1, 0), single(2, 1)], false, None));

        session.skip(q(1)).unwrap();
        assert!(session.is_skipped(q(1)));
        assert_eq!(session.active_index(), 1);

        session.select_answer(q(1), Answer::Single(0)).unwrap();
        assert!(!session.is_skipped(q(1)));
        assert_eq!(session.answer(q(1)), Some(&Answer::Single(0)));

        session.skip(q(1)).unwrap();
        assert!(session.is_skipped(q(1)));
        assert_eq!(session.answer(q(1)), None);
    }

    #[test]
    fn skipping_last_question_keeps_position() {
        let (mut session, _) = start(quiz(vec![single(1, 0), single(2, 1)], false, None));
        assert!(session.advance());
        session.skip(q(2)).unwrap();
        assert_eq!(session.active_index(), 1);
    }

    #[test]
    fn skipping_another_question_steps_forward_from_the_active_one() {
        let questions = (1..=4).map(|id| single(id, 0)).collect();
        let (mut session, _) = start(quiz(questions, false, None));

        session.skip(q(3)).unwrap();
        assert_eq!(session.active_index(), 1);

        while session.advance() {}
        assert_eq!(session.active_index(), 3);
        session.skip(q(1)).unwrap();
        assert_eq!(session.active_index(), 3);
        assert!(session.is_skipped(q(1)));
    }

    #[test]
    fn navigation_is_clamped() {
        let (mut session, _) = start(quiz(vec![single(1, 0), single(2, 1)], false, None));
        assert!(!session.retreat());
        assert!(session.advance());
        assert!(!session.advance());
        assert_eq!(session.active_index(), 1);
        assert!(session.retreat());
        assert_eq!(session.active_index(), 0);
    }

    #[test]
    fn toggle_option_builds_a_set_and_rejects_single_choice() {
        let (mut session, _) = start(quiz(vec![single(1, 0), multi(2, &[0, 2])], false, None));

        session.skip(q(2)).unwrap();
        session.toggle_option(q(2), 2).unwrap();
        session.toggle_option(q(2), 0).unwrap();
        session.toggle_option(q(2), 1).unwrap();
        session.toggle_option(q(2), 1).unwrap();
        assert_eq!(session.answer(q(2)), Some(&Answer::multiple([0, 2])));
        assert!(!session.is_skipped(q(2)));

        let err = session.toggle_option(q(1), 0).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidOperationForMode {
                restriction: Restriction::SingleChoice(_),
                ..
            }
        ));
        assert!(session.response(q(1)).is_none());

        assert!(matches!(
            session.toggle_option(q(2), 9),
            Err(SessionError::InvalidAnswer(_))
        ));
    }

    #[test]
    fn unchecking_everything_is_an_empty_answer_not_a_skip() {
        let (mut session, _) = start(quiz(vec![multi(1, &[])], false, None));
        session.toggle_option(q(1), 3).unwrap();
        session.toggle_option(q(1), 3).unwrap();
        assert_eq!(session.answer(q(1)), Some(&Answer::multiple([])));
        assert!(session.can_finish());

        let result = session.finish(fixed_now()).unwrap();
        assert_eq!(result.score(), 1);
        assert_eq!(result.skipped_count(), 0);
    }

    #[test]
    fn rejected_answers_leave_state_untouched() {
        let (mut session, _) = start(quiz(vec![single(1, 0), multi(2, &[1])], false, None));
        session.select_answer(q(1), Answer::Single(1)).unwrap();

        assert!(matches!(
            session.select_answer(q(1), Answer::Single(3)),
            Err(SessionError::InvalidAnswer(_))
        ));
        assert!(matches!(
            session.select_answer(q(2), Answer::Single(0)),
            Err(SessionError::InvalidAnswer(_))
        ));
        assert!(matches!(
            session.select_answer(q(7), Answer::Single(0)),
            Err(SessionError::UnknownQuestion(_))
        ));
        assert!(matches!(
            session.skip(q(7)),
            Err(SessionError::UnknownQuestion(_))
        ));

        assert_eq!(session.answer(q(1)), Some(&Answer::Single(1)));
        assert!(session.response(q(2)).is_none());
        assert_eq!(session.active_index(), 0);
    }

    #[test]
    fn finish_requires_every_question_resolved() {
        let (mut session, sink) = start(quiz(vec![single(1, 0), single(2, 1)], false, None));
        session.select_answer(q(1), Answer::Single(0)).unwrap();

        assert!(!session.can_finish());
        assert!(matches!(
            session.finish(fixed_now()),
            Err(SessionError::IncompleteQuiz { unresolved: 1 })
        ));
        assert_eq!(session.mode(), SessionMode::InProgress);
        assert!(session.result().is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn finish_scores_and_records_exactly_once() {
        let (mut session, sink) = start(quiz(vec![single(1, 0), single(2, 1)], false, None));
        session.select_answer(q(1), Answer::Single(0)).unwrap();
        session.skip(q(2)).unwrap();

        let result = session
            .finish(fixed_now() + Duration::milliseconds(61_500))
            .unwrap()
            .clone();
        assert_eq!(result.score(), 1);
        assert_eq!(result.skipped_count(), 1);
        assert_eq!(result.total_questions(), 2);
        assert_eq!(result.time_spent_secs(), 61);
        let second = result.answer_for(q(2)).unwrap();
        assert!(second.is_skipped);
        assert!(!second.is_correct);
        assert_eq!(second.submitted, SubmittedAnswer::Skipped);

        assert!(matches!(
            session.finish(fixed_now()),
            Err(SessionError::AlreadyCompleted)
        ));
        assert!(matches!(
            session.expire_by_timer(fixed_now()),
            Err(SessionError::AlreadyCompleted)
        ));
        assert_eq!(session.result(), Some(&result));
        assert_eq!(sink.results(), vec![result]);
    }

    #[test]
    fn expiry_scores_unresolved_questions_as_skipped() {
        let (mut session, sink) =
            start(quiz(vec![single(1, 0), single(2, 1), single(3, 2)], false, Some(60)));
        session.select_answer(q(1), Answer::Single(0)).unwrap();

        let result = session
            .expire_by_timer(fixed_now() + Duration::seconds(60))
            .unwrap();
        assert_eq!(result.skipped_count(), 2);
        assert_eq!(result.score(), 1);
        assert_eq!(result.time_spent_secs(), 60);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn completed_and_review_modes_are_read_only() {
        let (mut session, _) = start(quiz(vec![single(1, 0), single(2, 1)], false, None));
        session.select_answer(q(1), Answer::Single(0)).unwrap();
        session.select_answer(q(2), Answer::Single(1)).unwrap();
        assert!(session.advance());
        session.finish(fixed_now()).unwrap();

        assert!(matches!(
            session.select_answer(q(1), Answer::Single(1)),
            Err(SessionError::InvalidOperationForMode {
                restriction: Restriction::Completed,
                ..
            })
        ));

        session.enter_review().unwrap();
        assert_eq!(session.active_index(), 0);
        assert!(session.is_reviewing());
        assert!(matches!(
            session.skip(q(1)),
            Err(SessionError::InvalidOperationForMode {
                restriction: Restriction::Reviewing,
                ..
            })
        ));
        assert!(session.advance());
        assert_eq!(session.answer(q(1)), Some(&Answer::Single(0)));

        assert!(matches!(
            session.enter_review(),
            Err(SessionError::InvalidOperationForMode {
                operation: "enter_review",
                restriction: Restriction::Reviewing,
            })
        ));
        assert_eq!(session.active_index(), 1);
    }

    #[test]
    fn review_and_restart_require_completion() {
        let (mut session, _) = start(quiz(vec![single(1, 0)], false, None));
        assert!(matches!(
            session.enter_review(),
            Err(SessionError::InvalidOperationForMode { .. })
        ));
        assert!(matches!(
            session.restart(fixed_now()),
            Err(SessionError::InvalidOperationForMode { .. })
        ));
        assert_eq!(session.attempt(), 1);
    }

    #[test]
    fn restart_begins_a_fresh_attempt_and_keeps_prior_result() {
        let (mut session, sink) = start(quiz(vec![single(1, 0), single(2, 1)], false, None));
        session.select_answer(q(1), Answer::Single(0)).unwrap();
        session.skip(q(2)).unwrap();
        session.finish(fixed_now()).unwrap();
        session.enter_review().unwrap();

        let later = fixed_now() + Duration::minutes(5);
        session.restart(later).unwrap();
        assert_eq!(session.mode(), SessionMode::InProgress);
        assert_eq!(session.attempt(), 2);
        assert_eq!(session.started_at(), later);
        assert_eq!(session.active_index(), 0);
        assert!(session.response(q(1)).is_none());
        assert!(session.result().is_none());
        assert_eq!(sink.len(), 1);
    }

    /// Rotates by one more place on every call.
    #[derive(Default)]
    struct RotatingShuffler {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl QuestionShuffler for RotatingShuffler {
        fn shuffle(&self, questions: &mut [Question]) {
            let calls = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            let len = questions.len();
            questions.rotate_left(calls % len);
        }
    }

    fn order(session: &QuizSession) -> Vec<u64> {
        session.questions().iter().map(|q| q.id().value()).collect()
    }

    #[test]
    fn restart_draws_a_new_order_for_shuffled_quizzes() {
        let source = quiz((1..=4).map(|id| single(id, 0)).collect(), true, None);
        let shuffler = Arc::new(RotatingShuffler::default());
        let mut session = QuizSession::start(
            Arc::clone(&source),
            Arc::clone(&shuffler) as Arc<dyn QuestionShuffler>,
            Arc::new(MemoryResultSink::new()),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(order(&session), vec![2, 3, 4, 1]);

        for id in 1..=4 {
            session.skip(q(id)).unwrap();
        }
        session.finish(fixed_now()).unwrap();
        session.restart(fixed_now()).unwrap();

        assert_eq!(shuffler.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(order(&session), vec![3, 4, 1, 2]);
        let authored: Vec<u64> = source.questions().iter().map(|q| q.id().value()).collect();
        assert_eq!(authored, vec![1, 2, 3, 4]);
    }

    #[test]
    fn shuffle_keeps_question_set_and_leaves_quiz_untouched() {
        let source = quiz((1..=8).map(|id| single(id, 0)).collect(), true, None);
        let authored: Vec<QuestionId> = source.questions().iter().map(Question::id).collect();
        let (session, _) = start(Arc::clone(&source));

        let mut drawn: Vec<QuestionId> = session.questions().iter().map(Question::id).collect();
        let quiz_order: Vec<QuestionId> = session.quiz().questions().iter().map(Question::id).collect();
        assert_eq!(quiz_order, authored);

        drawn.sort();
        assert_eq!(drawn, authored);
    }

    #[test]
    fn unshuffled_quiz_keeps_authored_order() {
        let (session, _) = start(quiz(vec![single(3, 0), single(1, 0), single(2, 0)], false, None));
        let order: Vec<u64> = session.questions().iter().map(|q| q.id().value()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn progress_counts_answers_and_skips() {
        let (mut session, _) = start(quiz(vec![single(1, 0), single(2, 1), single(3, 2)], false, None));
        session.select_answer(q(1), Answer::Single(2)).unwrap();
        session.skip(q(2)).unwrap();

        let progress = session.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.skipped, 1);
        assert_eq!(progress.remaining, 1);
        assert_eq!(progress.position, 2);
        assert!(!progress.is_complete);
    }
}
