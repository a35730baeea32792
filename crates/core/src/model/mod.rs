mod answer;
mod ids;
mod question;
mod quiz;
mod result;

pub use answer::{Answer, Response};
pub use ids::{ParseIdError, QuestionId, QuizId, ResultId};
pub use question::{CorrectAnswer, Question, QuestionError, QuestionKind};
pub use quiz::{Quiz, QuizDraft, QuizError, ValidatedQuiz};
pub use result::{AnswerRecord, QuizResult, QuizResultError, SubmittedAnswer};
