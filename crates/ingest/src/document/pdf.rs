use super::{ExtractionError, PageContent};

pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractionError> {
    let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let pages = number_pages(texts);
    if pages.is_empty() {
        // Scanned/image-only PDFs parse fine but carry no text layer.
        tracing::warn!("PDF parsed but contains no extractable text");
    }
    Ok(pages)
}

/// Number page texts from 1 by position; blank pages are skipped.
fn number_pages<S: AsRef<str>>(texts: impl IntoIterator<Item = S>) -> Vec<PageContent> {
    texts
        .into_iter()
        .enumerate()
        .filter_map(|(i, page_text)| {
            let trimmed = page_text.as_ref().trim();
            (!trimmed.is_empty()).then(|| PageContent {
                page_number: i + 1,
                text: trimmed.to_string(),
            })
        })
        .collect()
}

/// Plain text has no page structure beyond form feeds (\x0C); without any,
/// the whole text is page 1.
pub(super) fn split_pages(text: &str) -> Vec<PageContent> {
    number_pages(text.split('\x0C'))
}
