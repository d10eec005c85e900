use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::types::RawTestRecord;

/// First `[` through the last `]`, across newlines.
static JSON_ARRAY_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

/// Why a model response yielded no records.
#[derive(Error, Debug, PartialEq)]
pub enum ResponseParseError {
    #[error("no JSON array found in response")]
    NoArrayFound,

    #[error("JSON array could not be parsed: {0}")]
    InvalidJson(String),
}

/// Parse a model response into raw test records.
///
/// The whole response is tried as JSON first. If that is not an array, the
/// bracketed span is cut out of the surrounding prose or code fences and
/// parsed on its own.
pub fn parse_test_records(response: &str) -> Result<Vec<RawTestRecord>, ResponseParseError> {
    let trimmed = response.trim();

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(records_from_items(items));
    }

    let span = JSON_ARRAY_SPAN
        .find(trimmed)
        .ok_or(ResponseParseError::NoArrayFound)?;

    match serde_json::from_str::<Value>(span.as_str()) {
        Ok(Value::Array(items)) => Ok(records_from_items(items)),
        Ok(_) => Err(ResponseParseError::NoArrayFound),
        Err(e) => Err(ResponseParseError::InvalidJson(e.to_string())),
    }
}

/// One record per array item. Items that are not objects become empty
/// records so they still show up (as unknown) downstream.
fn records_from_items(items: Vec<Value>) -> Vec<RawTestRecord> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect()
}
