use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use quiz_core::model::QuizResult;
use storage::repository::ResultRepository;

/// Write-only destination for completed results.
///
/// `record` is fire-and-forget: a session hands its result over exactly once
/// and never learns whether persistence succeeded.
pub trait ResultSink: Send + Sync {
    fn record(&self, result: QuizResult);
}

/// Keeps results in memory. Useful for tests and for previews that should not persist.
#[derive(Debug, Clone, Default)]
pub struct MemoryResultSink {
    results: Arc<Mutex<Vec<QuizResult>>>,
}

impl MemoryResultSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded results, oldest first.
    #[must_use]
    pub fn results(&self) -> Vec<QuizResult> {
        match self.results.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemoryResultSink {
    fn record(&self, result: QuizResult) {
        match self.results.lock() {
            Ok(mut guard) => guard.push(result),
            Err(poisoned) => poisoned.into_inner().push(result),
        }
    }
}

/// Forwards results to a background writer task.
#[derive(Debug, Clone)]
pub struct ChannelResultSink {
    tx: mpsc::UnboundedSender<QuizResult>,
}

impl ResultSink for ChannelResultSink {
    fn record(&self, result: QuizResult) {
        let quiz_id = result.quiz_id();
        if self.tx.send(result).is_err() {
            tracing::warn!(%quiz_id, "result writer has stopped; result dropped");
        }
    }
}

/// Spawn a task that appends every recorded result to `repo`.
///
/// The task ends once every clone of the returned sink has been dropped; its
/// output is the number of results persisted. Append failures are logged and
/// do not stop the writer. Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_result_writer(
    repo: Arc<dyn ResultRepository>,
) -> (ChannelResultSink, JoinHandle<usize>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<QuizResult>();
    let handle = tokio::spawn(async move {
        let mut written = 0;
        while let Some(result) = rx.recv().await {
            match repo.append_result(&result).await {
                Ok(id) => {
                    written += 1;
                    tracing::debug!(result_id = id, quiz_id = %result.quiz_id(), "result persisted");
                }
                Err(err) => {
                    tracing::warn!(quiz_id = %result.quiz_id(), error = %err, "failed to persist result");
                }
            }
        }
        written
    });
    (ChannelResultSink { tx }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerRecord, QuestionId, QuizId};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn result(quiz: u64) -> QuizResult {
        QuizResult::from_answers(
            QuizId::new(quiz),
            12,
            fixed_now(),
            vec![AnswerRecord::skipped(QuestionId::new(1))],
        )
        .unwrap()
    }

    #[test]
    fn memory_sink_keeps_results_in_order() {
        let sink = MemoryResultSink::new();
        assert!(sink.is_empty());
        sink.record(result(1));
        sink.record(result(2));
        let ids: Vec<u64> = sink.results().iter().map(|r| r.quiz_id().value()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn channel_sink_persists_through_writer() {
        let repo = InMemoryRepository::new();
        let (sink, handle) = spawn_result_writer(Arc::new(repo.clone()));
        sink.record(result(3));
        sink.record(result(4));
        drop(sink);

        assert_eq!(handle.await.unwrap(), 2);
        let rows = repo.list_results(None, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
