use serde::Serialize;

use quiz_core::model::{CorrectAnswer, QuestionId, QuestionKind, QuizId, QuizResult, Response};

use super::progress::SessionProgress;
use super::service::{QuizSession, SessionMode};

/// Correctness details, revealed only after scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub is_correct: bool,
    pub is_skipped: bool,
    pub correct: CorrectAnswer,
    pub explanation: Option<String>,
}

/// One question as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub kind: QuestionKind,
    pub response: Option<Response>,
    pub is_active: bool,
    pub outcome: Option<QuestionOutcome>,
}

/// Read-only copy of a session's state, rebuilt after every operation.
///
/// Holds no references into the session, so a UI can keep it across mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub quiz_id: QuizId,
    pub title: String,
    pub description: String,
    pub time_limit_secs: Option<u32>,
    pub mode: SessionMode,
    pub attempt: u32,
    pub active_index: usize,
    pub questions: Vec<QuestionView>,
    pub progress: SessionProgress,
    pub can_finish: bool,
    pub result: Option<QuizResult>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn active_question(&self) -> Option<&QuestionView> {
        self.questions.get(self.active_index)
    }
}

impl QuizSession {
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let result = self.result();
        let questions = self
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let outcome = result
                    .and_then(|r| r.answer_for(question.id()))
                    .map(|record| QuestionOutcome {
                        is_correct: record.is_correct,
                        is_skipped: record.is_skipped,
                        correct: question.correct().clone(),
                        explanation: question.explanation().map(str::to_owned),
                    });
                QuestionView {
                    id: question.id(),
                    text: question.text().to_owned(),
                    options: question.options().to_vec(),
                    kind: question.kind(),
                    response: self.response(question.id()).cloned(),
                    is_active: index == self.active_index(),
                    outcome,
                }
            })
            .collect();

        let quiz = self.quiz();
        SessionSnapshot {
            quiz_id: quiz.id(),
            title: quiz.title().to_owned(),
            description: quiz.description().to_owned(),
            time_limit_secs: quiz.time_limit_secs(),
            mode: self.mode(),
            attempt: self.attempt(),
            active_index: self.active_index(),
            questions,
            progress: self.progress(),
            can_finish: self.can_finish() && self.mode() == SessionMode::InProgress,
            result: result.cloned(),
        }
    }
}
