use std::panic::{catch_unwind, AssertUnwindSafe};

use super::types::TextExtractor;
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers; page texts are joined
/// with a newline.
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Text of each page, in page order.
    pub fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        // pdf-extract panics on some malformed inputs instead of returning an error.
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        }));

        match outcome {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(ExtractionError::PdfParsing(e.to_string())),
            Err(_) => Err(ExtractionError::PdfParsing(
                "PDF parser aborted on malformed input".into(),
            )),
        }
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, document: &[u8]) -> Result<String, ExtractionError> {
        let pages = self.extract_pages(document)?;
        tracing::debug!(pages = pages.len(), "PDF text layer extracted");

        let mut text = String::new();
        for page in pages {
            text.push_str(&page);
            text.push('\n');
        }
        Ok(text)
    }
}
