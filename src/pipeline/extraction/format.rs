use serde::{Deserialize, Serialize};

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    PlainText,
    Unsupported,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PlainText => "plain_text",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Detect the document format from magic bytes, never from a file name.
pub fn detect_format(bytes: &[u8]) -> DocumentFormat {
    match bytes {
        [0x25, 0x50, 0x44, 0x46, ..] => DocumentFormat::Pdf,
        _ if looks_like_text(bytes) => DocumentFormat::PlainText,
        _ => DocumentFormat::Unsupported,
    }
}

/// UTF-8 with no NUL bytes or stray control characters.
fn looks_like_text(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(text) => !text
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\u{0C}')),
        Err(_) => false,
    }
}
