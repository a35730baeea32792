use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use quiz_core::model::{QuizId, QuizResult, ResultId};
use storage::repository::{QuizRepository, QuizResultRow, ResultRepository};

use crate::error::HistoryError;

/// Title shown for results whose quiz has since been deleted.
pub const UNKNOWN_QUIZ_TITLE: &str = "Unknown Quiz";

/// Coarse grading of a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    #[must_use]
    pub fn for_percentage(percentage: u32) -> Self {
        if percentage >= 80 {
            ScoreBand::High
        } else if percentage >= 60 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }
}

/// One past attempt, joined with the title of its quiz.
///
/// Presentation-agnostic: no pre-formatted strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    pub id: ResultId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub band: ScoreBand,
    pub time_spent_secs: u64,
    pub skipped_count: u32,
    pub completed_at: DateTime<Utc>,
}

impl HistoryItem {
    #[must_use]
    pub fn from_row(row: &QuizResultRow, quiz_title: String) -> Self {
        let result = &row.result;
        let percentage = result.percentage();
        Self {
            id: row.id,
            quiz_id: result.quiz_id(),
            quiz_title,
            score: result.score(),
            total_questions: result.total_questions(),
            percentage,
            band: ScoreBand::for_percentage(percentage),
            time_spent_secs: result.time_spent_secs(),
            skipped_count: result.skipped_count(),
            completed_at: result.completed_at(),
        }
    }
}

/// Totals across every recorded attempt. All zero for an empty history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HistoryStats {
    pub total_attempts: u32,
    /// Mean of each attempt's exact percentage.
    pub average_percentage: f64,
    pub average_time_secs: f64,
    pub total_skipped: u64,
}

impl HistoryStats {
    #[must_use]
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a QuizResult>) -> Self {
        let mut stats = Self::default();
        let mut percentage_sum = 0.0;
        let mut time_sum = 0.0;
        for result in results {
            stats.total_attempts = stats.total_attempts.saturating_add(1);
            if result.total_questions() > 0 {
                percentage_sum +=
                    f64::from(result.score()) / f64::from(result.total_questions()) * 100.0;
            }
            time_sum += secs_as_f64(result.time_spent_secs());
            stats.total_skipped += u64::from(result.skipped_count());
        }
        if stats.total_attempts > 0 {
            let n = f64::from(stats.total_attempts);
            stats.average_percentage = percentage_sum / n;
            stats.average_time_secs = time_sum / n;
        }
        stats
    }

    /// Average time in whole minutes, rounded.
    #[must_use]
    pub fn average_minutes(&self) -> f64 {
        (self.average_time_secs / 60.0).round()
    }
}

// Quiz durations never approach 2^52 seconds.
#[allow(clippy::cast_precision_loss)]
fn secs_as_f64(secs: u64) -> f64 {
    secs as f64
}

/// Read side of the result store.
#[derive(Clone)]
pub struct HistoryService {
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn ResultRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>, results: Arc<dyn ResultRepository>) -> Self {
        Self { quizzes, results }
    }

    /// Most recent attempts first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if repository access fails.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<HistoryItem>, HistoryError> {
        let rows = self.results.list_results(None, limit).await?;
        let mut titles: HashMap<QuizId, String> = HashMap::new();
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let quiz_id = row.result.quiz_id();
            let title = match titles.get(&quiz_id) {
                Some(title) => title.clone(),
                None => {
                    let title = self
                        .quizzes
                        .get_quiz(quiz_id)
                        .await?
                        .map_or_else(|| UNKNOWN_QUIZ_TITLE.to_owned(), |q| q.title().to_owned());
                    titles.insert(quiz_id, title.clone());
                    title
                }
            };
            items.push(HistoryItem::from_row(row, title));
        }
        Ok(items)
    }

    /// Attempts recorded for one quiz, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if repository access fails.
    pub async fn list_for_quiz(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, HistoryError> {
        Ok(self.results.list_results(Some(quiz_id), limit).await?)
    }

    /// Totals across the whole history.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if repository access fails.
    pub async fn stats(&self) -> Result<HistoryStats, HistoryError> {
        let rows = self.results.list_results(None, u32::MAX).await?;
        Ok(HistoryStats::from_results(rows.iter().map(|row| &row.result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use quiz_core::model::{Answer, AnswerRecord, QuestionId};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;
    use storage::sample::sample_quiz_draft;

    /// `total` questions: the first `correct` right, the next `skipped` skipped, the rest wrong.
    fn result(
        quiz_id: QuizId,
        correct: u64,
        skipped: u64,
        total: u64,
        secs: u64,
        minutes_ago: i64,
    ) -> QuizResult {
        let answers = (0..total)
            .map(|i| {
                let id = QuestionId::new(i + 1);
                if i < correct {
                    AnswerRecord::answered(id, Answer::Single(0), true)
                } else if i < correct + skipped {
                    AnswerRecord::skipped(id)
                } else {
                    AnswerRecord::answered(id, Answer::Single(1), false)
                }
            })
            .collect();
        QuizResult::from_answers(
            quiz_id,
            secs,
            fixed_now() - Duration::minutes(minutes_ago),
            answers,
        )
        .unwrap()
    }

    #[test]
    fn score_bands() {
        assert_eq!(ScoreBand::for_percentage(100), ScoreBand::High);
        assert_eq!(ScoreBand::for_percentage(80), ScoreBand::High);
        assert_eq!(ScoreBand::for_percentage(79), ScoreBand::Medium);
        assert_eq!(ScoreBand::for_percentage(60), ScoreBand::Medium);
        assert_eq!(ScoreBand::for_percentage(59), ScoreBand::Low);
    }

    #[test]
    fn empty_history_has_zero_stats() {
        let stats = HistoryStats::from_results(std::iter::empty());
        assert_eq!(stats, HistoryStats::default());
        assert_eq!(stats.total_attempts, 0);
    }

    #[test]
    fn stats_average_exact_percentages() {
        let quiz = QuizId::new(1);
        let results = [result(quiz, 1, 0, 3, 60, 0), result(quiz, 2, 1, 3, 120, 1)];
        let stats = HistoryStats::from_results(&results);
        assert_eq!(stats.total_attempts, 2);
        assert!((stats.average_percentage - 50.0).abs() < 1e-9);
        assert!((stats.average_time_secs - 90.0).abs() < 1e-9);
        assert_eq!(stats.total_skipped, 1);
        assert!((stats.average_minutes() - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn recent_history_joins_titles_and_survives_deletion() {
        let repo = Arc::new(InMemoryRepository::new());
        let kept = repo
            .insert_new_quiz(sample_quiz_draft().validate(fixed_now()).unwrap())
            .await
            .unwrap();
        let removed = repo
            .insert_new_quiz(sample_quiz_draft().validate(fixed_now()).unwrap())
            .await
            .unwrap();
        repo.append_result(&result(kept, 4, 1, 5, 30, 10)).await.unwrap();
        repo.append_result(&result(removed, 2, 0, 5, 45, 5)).await.unwrap();
        repo.delete_quiz(removed).await.unwrap();

        let history = HistoryService::new(repo.clone(), repo);
        let items = history.list_recent(10).await.unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].quiz_id, removed);
        assert_eq!(items[0].quiz_title, UNKNOWN_QUIZ_TITLE);
        assert_eq!(items[0].percentage, 40);
        assert_eq!(items[0].band, ScoreBand::Low);

        assert_eq!(items[1].quiz_title, "General Knowledge");
        assert_eq!(items[1].percentage, 80);
        assert_eq!(items[1].band, ScoreBand::High);

        let stats = history.stats().await.unwrap();
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.total_skipped, 1);
        assert_eq!(history.list_for_quiz(kept, 10).await.unwrap().len(), 1);
    }
}
