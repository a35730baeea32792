use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub skipped: usize,
    /// Questions with neither an answer nor a skip.
    pub remaining: usize,
    /// 1-based position of the active question.
    pub position: usize,
    pub is_complete: bool,
}
