use super::types::TextExtractor;
use super::ExtractionError;

/// UTF-8 read for reports that arrive as plain text (exports, pasted results).
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, document: &[u8]) -> Result<String, ExtractionError> {
        String::from_utf8(document.to_vec())
            .map_err(|e| ExtractionError::EncodingError(e.to_string()))
    }
}
