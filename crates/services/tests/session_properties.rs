use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use quiz_core::model::{Answer, Question, QuestionId, Quiz, QuizDraft, QuizId};
use quiz_core::time::fixed_now;
use services::{MemoryResultSink, QuizSession, SeededShuffler, SessionError, SessionMode};

fn single(id: u64, correct: usize) -> Question {
    Question::single_choice(
        QuestionId::new(id),
        format!("Question {id}"),
        vec!["zero".into(), "one".into(), "two".into(), "three".into()],
        correct,
        None,
    )
    .unwrap()
}

fn multi(id: u64, correct: &[usize]) -> Question {
    Question::multiple_choice(
        QuestionId::new(id),
        format!("Question {id}"),
        vec!["zero".into(), "one".into(), "two".into(), "three".into()],
        correct.iter().copied(),
        None,
    )
    .unwrap()
}

fn quiz(questions: Vec<Question>, shuffle: bool, limit: Option<u32>) -> Arc<Quiz> {
    Arc::new(
        QuizDraft {
            title: "Properties".into(),
            description: "Observable session behavior".into(),
            time_limit_secs: limit,
            shuffle_questions: shuffle,
            questions,
        }
        .validate(fixed_now())
        .unwrap()
        .assign_id(QuizId::new(1)),
    )
}

fn start(quiz: Arc<Quiz>, seed: u64) -> (QuizSession, MemoryResultSink) {
    let sink = MemoryResultSink::new();
    let session = QuizSession::start(
        quiz,
        Arc::new(SeededShuffler::new(seed)),
        Arc::new(sink.clone()),
        fixed_now(),
    )
    .unwrap();
    (session, sink)
}

fn id(raw: u64) -> QuestionId {
    QuestionId::new(raw)
}

#[test]
fn answer_and_skip_are_mutually_exclusive_throughout() {
    let (mut session, _) = start(quiz(vec![single(1, 0), multi(2, &[1]), single(3, 2)], false, None), 0);

    let check = |session: &QuizSession| {
        for q in session.questions() {
            assert!(
                !(session.answer(q.id()).is_some() && session.is_skipped(q.id())),
                "question {} is both answered and skipped",
                q.id()
            );
        }
    };

    session.skip(id(1)).unwrap();
    check(&session);
    session.select_answer(id(1), Answer::Single(3)).unwrap();
    check(&session);
    session.toggle_option(id(2), 1).unwrap();
    check(&session);
    session.skip(id(2)).unwrap();
    check(&session);
    session.toggle_option(id(2), 0).unwrap();
    check(&session);
    session.skip(id(3)).unwrap();
    check(&session);
}

#[test]
fn finish_without_full_coverage_leaves_state_unchanged() {
    let (mut session, sink) = start(quiz(vec![single(1, 0), single(2, 1)], false, None), 0);
    session.skip(id(1)).unwrap();
    let before = session.snapshot();

    let err = session.finish(fixed_now()).unwrap_err();
    assert!(matches!(err, SessionError::IncompleteQuiz { unresolved: 1 }));
    assert_eq!(session.snapshot(), before);
    assert!(sink.is_empty());
}

#[test]
fn second_finish_is_rejected_and_result_is_stable() {
    let (mut session, sink) = start(quiz(vec![single(1, 0)], false, None), 0);
    session.select_answer(id(1), Answer::Single(0)).unwrap();
    let first = session.finish(fixed_now()).unwrap().clone();

    let err = session
        .finish(fixed_now() + Duration::seconds(30))
        .unwrap_err();
    assert!(matches!(err, SessionError::AlreadyCompleted));
    assert_eq!(session.result(), Some(&first));
    assert_eq!(sink.len(), 1);
}

#[test]
fn multiple_choice_is_scored_as_a_set() {
    let (mut session, _) = start(quiz(vec![multi(1, &[0, 2]), multi(2, &[0, 2])], false, None), 0);
    session.select_answer(id(1), Answer::multiple([2, 0])).unwrap();
    session
        .select_answer(id(2), Answer::multiple([0, 1, 2]))
        .unwrap();

    let result = session.finish(fixed_now()).unwrap();
    assert!(result.answer_for(id(1)).unwrap().is_correct);
    assert!(!result.answer_for(id(2)).unwrap().is_correct);
    assert_eq!(result.score(), 1);
}

#[test]
fn single_choice_compares_the_index() {
    let (mut session, _) = start(quiz(vec![single(1, 2), single(2, 2)], false, None), 0);
    session.select_answer(id(1), Answer::Single(1)).unwrap();
    session.select_answer(id(2), Answer::Single(2)).unwrap();

    let result = session.finish(fixed_now()).unwrap();
    assert!(!result.answer_for(id(1)).unwrap().is_correct);
    assert!(result.answer_for(id(2)).unwrap().is_correct);
}

#[test]
fn answering_after_skipping_counts_as_answered() {
    let (mut session, _) = start(quiz(vec![single(1, 0), single(2, 1)], false, None), 0);
    session.skip(id(1)).unwrap();
    session.select_answer(id(1), Answer::Single(0)).unwrap();
    session.select_answer(id(2), Answer::Single(0)).unwrap();

    let result = session.finish(fixed_now()).unwrap();
    let first = result.answer_for(id(1)).unwrap();
    assert!(!first.is_skipped);
    assert!(first.is_correct);
    assert_eq!(result.skipped_count(), 0);
}

#[test]
fn timer_expiry_treats_unresolved_questions_as_skipped() {
    let (mut session, _) = start(
        quiz(vec![single(1, 0), single(2, 1), single(3, 2)], false, Some(60)),
        0,
    );
    session.select_answer(id(1), Answer::Single(0)).unwrap();

    let result = session
        .expire_by_timer(fixed_now() + Duration::seconds(60))
        .unwrap();
    assert_eq!(result.skipped_count(), 2);
    assert_eq!(result.score(), 1);
    assert_eq!(session.mode(), SessionMode::Completed);
}

#[test]
fn shuffle_preserves_the_question_multiset() {
    let source = quiz((1..=10).map(|q| single(q, 0)).collect(), true, None);
    let authored: Vec<QuestionId> = source.questions().iter().map(Question::id).collect();

    for seed in 0..5 {
        let (session, _) = start(Arc::clone(&source), seed);
        let drawn: HashSet<QuestionId> = session.questions().iter().map(Question::id).collect();
        assert_eq!(session.questions().len(), authored.len());
        assert_eq!(drawn, authored.iter().copied().collect());
    }
    let after: Vec<QuestionId> = source.questions().iter().map(Question::id).collect();
    assert_eq!(after, authored);
}

#[test]
fn same_seed_gives_same_order() {
    let source = quiz((1..=10).map(|q| single(q, 0)).collect(), true, None);
    let order = |seed| {
        let (session, _) = start(Arc::clone(&source), seed);
        session
            .questions()
            .iter()
            .map(Question::id)
            .collect::<Vec<_>>()
    };
    assert_eq!(order(11), order(11));
}

#[test]
fn restart_reshuffles_the_same_question_set() {
    let source = quiz((1..=10).map(|q| single(q, 0)).collect(), true, None);
    let authored: Vec<QuestionId> = source.questions().iter().map(Question::id).collect();
    let orders = |seed| {
        let (mut session, sink) = start(Arc::clone(&source), seed);
        let mut draws = vec![session.questions().iter().map(Question::id).collect::<Vec<_>>()];
        for _ in 0..3 {
            for q in &authored {
                session.skip(*q).unwrap();
            }
            session.finish(fixed_now()).unwrap();
            session.restart(fixed_now()).unwrap();
            draws.push(session.questions().iter().map(Question::id).collect());
        }
        assert_eq!(sink.len(), 3);
        assert_eq!(session.attempt(), 4);
        let quiz_order: Vec<QuestionId> = session.quiz().questions().iter().map(Question::id).collect();
        assert_eq!(quiz_order, authored);
        draws
    };

    let draws = orders(7);
    for draw in &draws {
        let set: HashSet<QuestionId> = draw.iter().copied().collect();
        assert_eq!(draw.len(), authored.len());
        assert_eq!(set, authored.iter().copied().collect());
    }
    // Four draws of ten questions from one RNG stream are not all identical.
    assert!(draws.windows(2).any(|pair| pair[0] != pair[1]));
    assert_eq!(orders(7), draws);
}

#[test]
fn end_to_end_answer_then_skip() {
    let (mut session, sink) = start(quiz(vec![single(1, 0), single(2, 1)], false, None), 0);
    session.select_answer(id(1), Answer::Single(0)).unwrap();
    assert!(session.advance());
    session.skip(id(2)).unwrap();
    assert!(session.can_finish());

    let result = session.finish(fixed_now() + Duration::seconds(12)).unwrap();
    assert_eq!(result.score(), 1);
    assert_eq!(result.skipped_count(), 1);
    assert_eq!(result.total_questions(), 2);
    assert_eq!(result.time_spent_secs(), 12);
    let second = &result.answers()[1];
    assert_eq!(second.question_id, id(2));
    assert!(second.is_skipped);
    assert!(!second.is_correct);
    assert_eq!(sink.len(), 1);
}
