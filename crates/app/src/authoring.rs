use std::path::Path;

use quiz_core::model::{Quiz, QuizDraft, QuizId};
use services::QuizCatalogService;

/// Parse a quiz in the JSON authoring format.
///
/// # Errors
///
/// Returns the `serde_json` error for malformed documents. Content rules are
/// checked later by the catalog.
pub fn parse_draft(json: &str) -> Result<QuizDraft, serde_json::Error> {
    serde_json::from_str(json)
}

fn read_draft(path: &Path) -> Result<QuizDraft, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    parse_draft(&text).map_err(|err| format!("{}: {err}", path.display()).into())
}

/// Create a quiz from a JSON file.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, or the catalog rejects it.
pub async fn import_quiz(
    catalog: &QuizCatalogService,
    path: &Path,
) -> Result<Quiz, Box<dyn std::error::Error>> {
    let draft = read_draft(path)?;
    Ok(catalog.create_quiz(draft).await?)
}

/// Replace an existing quiz with the contents of a JSON file.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, or the catalog rejects it.
pub async fn edit_quiz(
    catalog: &QuizCatalogService,
    id: QuizId,
    path: &Path,
) -> Result<Quiz, Box<dyn std::error::Error>> {
    let draft = read_draft(path)?;
    Ok(catalog.update_quiz(id, draft).await?)
}

/// A quiz as pretty-printed authoring JSON, ready to edit and re-import.
///
/// # Errors
///
/// Fails if the quiz does not exist.
pub async fn export_quiz(
    catalog: &QuizCatalogService,
    id: QuizId,
) -> Result<String, Box<dyn std::error::Error>> {
    let quiz = catalog.get_quiz(id).await?;
    Ok(serde_json::to_string_pretty(&QuizDraft::from(&quiz))?)
}
