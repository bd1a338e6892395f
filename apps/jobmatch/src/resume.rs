use std::fs;
use std::path::Path;

use tracing::info;

use crate::errors::AppError;

/// Reads the candidate resume as plain text. `.pdf` files go through
/// `pdf-extract`; anything else is read as UTF-8.
///
/// A missing file or a resume with no text is fatal for the analysis run.
pub fn load_resume_text(path: &Path) -> Result<String, AppError> {
    if !path.exists() {
        return Err(AppError::MissingResource(format!(
            "resume '{}' not found",
            path.display()
        )));
    }

    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        let data = fs::read(path)?;
        pdf_extract::extract_text_from_mem(&data).map_err(|e| {
            AppError::Validation(format!("could not extract text from '{}': {e}", path.display()))
        })?
    } else {
        fs::read_to_string(path)?
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(format!(
            "resume '{}' contains no text",
            path.display()
        )));
    }

    info!("Resume loaded from {} ({} chars)", path.display(), text.chars().count());
    Ok(text)
}
