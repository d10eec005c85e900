use super::format::{detect_format, DocumentFormat};
use super::pdf::PdfTextExtractor;
use super::plain::PlainTextExtractor;
use super::ExtractionError;

/// Turns an uploaded document into raw text (allows mocking for tests).
pub trait TextExtractor {
    fn extract_text(&self, document: &[u8]) -> Result<String, ExtractionError>;
}

/// Extractor that picks the PDF or plain-text path from the document's
/// magic bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentTextExtractor;

impl TextExtractor for DocumentTextExtractor {
    fn extract_text(&self, document: &[u8]) -> Result<String, ExtractionError> {
        let format = detect_format(document);
        tracing::debug!(format = format.as_str(), bytes = document.len(), "Extracting report text");

        match format {
            DocumentFormat::Pdf => PdfTextExtractor.extract_text(document),
            DocumentFormat::PlainText => PlainTextExtractor.extract_text(document),
            DocumentFormat::Unsupported => Err(ExtractionError::UnsupportedFormat),
        }
    }
}
