use std::path::Path;

use tracing::info;

use crate::error::{AppError, AppResult};

/// Extract the full text of a PDF.
///
/// `pdf-extract` separates pages with form feeds; pages are rejoined with
/// newlines so downstream chunking sees one continuous text. Unreadable or
/// corrupt files fail with [`AppError::Extraction`]. The result is opaque
/// text as far as the rest of the pipeline is concerned.
pub fn extract_text(path: &Path) -> AppResult<String> {
    let raw = pdf_extract::extract_text(path)
        .map_err(|e| AppError::Extraction(format!("{}: {e}", path.display())))?;

    let text = raw
        .split('\x0c')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    info!(path = %path.display(), chars = text.chars().count(), "extracted PDF text");
    Ok(text)
}
