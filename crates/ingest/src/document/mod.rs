pub mod splitter;
mod pdf;

use std::path::Path;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A page of extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    /// The extracted text content.
    pub text: String,
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Name of the file the pages came from.
    pub filename: String,
    /// Extracted pages, in document order. Pages without text are omitted.
    pub pages: Vec<PageContent>,
}

impl ExtractedDocument {
    /// Total character count across all pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Reject anything that does not carry a `.pdf` extension.
pub fn ensure_pdf_filename(filename: &str) -> Result<(), ExtractionError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext == "pdf" {
        Ok(())
    } else if ext.is_empty() {
        Err(ExtractionError::UnsupportedType("(no extension)".to_string()))
    } else {
        Err(ExtractionError::UnsupportedType(ext))
    }
}

/// Write an uploaded file to `path`, replacing whatever the previous upload left there.
pub async fn persist_upload(path: &Path, bytes: &[u8]) -> Result<(), ExtractionError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    info!("Persisted upload ({} bytes) to {}", bytes.len(), path.display());
    Ok(())
}

/// Extract text from raw bytes, dispatching on the filename's extension.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractionError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let pages = match ext.as_str() {
        "pdf" => pdf::extract_pdf(bytes)?,
        "txt" => pdf::split_pages(&String::from_utf8_lossy(bytes)),
        other => return Err(ExtractionError::UnsupportedType(other.to_string())),
    };

    Ok(ExtractedDocument {
        filename: filename.to_string(),
        pages,
    })
}

/// Read a PDF from disk and parse it into page records.
///
/// Blocking: parsing is CPU-bound, callers on an async runtime should move this
/// onto a blocking thread.
pub fn load_pdf(path: &Path) -> Result<ExtractedDocument, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let pages = pdf::extract_pdf(&bytes)?;
    let doc = ExtractedDocument { filename, pages };
    info!(
        "Extracted '{}': {} pages, {} chars",
        doc.filename,
        doc.pages.len(),
        doc.total_chars()
    );
    Ok(doc)
}
