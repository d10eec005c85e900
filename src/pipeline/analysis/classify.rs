use std::sync::LazyLock;

use regex::Regex;

use super::types::{ClassifiedResult, Direction, RawTestRecord, RiskLevel};

/// Leading decimal number: optional sign, digits with optional fraction,
/// optional exponent. Anything after it ("g/dL", "H") is ignored.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").unwrap()
});

/// How a record is evaluated, decided once per record.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<'a> {
    /// Numeric result with at least one reference bound present.
    Quantitative {
        value: f64,
        low: Option<f64>,
        high: Option<f64>,
    },
    /// Everything else: keyword matching against the textual reference.
    Qualitative { value: &'a str, ref_text: &'a str },
}

impl<'a> Classification<'a> {
    pub fn of(record: &'a RawTestRecord) -> Self {
        let has_bound = !record.ref_range_low.is_empty() || !record.ref_range_high.is_empty();
        match parse_number(&record.result_value) {
            Some(value) if has_bound => Self::Quantitative {
                value,
                low: parse_number(&record.ref_range_low),
                high: parse_number(&record.ref_range_high),
            },
            _ => Self::Qualitative {
                value: &record.result_value,
                ref_text: &record.ref_range_text,
            },
        }
    }

    pub fn evaluate(&self) -> (RiskLevel, Direction) {
        match *self {
            Self::Quantitative {
                value,
                low: Some(low),
                high: Some(high),
            } => compare_to_range(value, low, high),
            Self::Quantitative { .. } => (RiskLevel::Unknown, Direction::Unknown),
            Self::Qualitative { value, ref_text } => match_qualitative(value, ref_text),
        }
    }
}

/// Parse the leading number of a string. Non-finite values count as
/// non-numeric.
pub fn parse_number(text: &str) -> Option<f64> {
    let m = LEADING_NUMBER.find(text.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Both bounds inclusive. Out-of-range numeric values are borderline,
/// never high risk.
fn compare_to_range(value: f64, low: f64, high: f64) -> (RiskLevel, Direction) {
    if value < low {
        (RiskLevel::Borderline, Direction::Low)
    } else if value > high {
        (RiskLevel::Borderline, Direction::High)
    } else {
        (RiskLevel::Normal, Direction::Normal)
    }
}

/// Positive/negative keyword matching. Only "negative"-expected references
/// can be judged; anything else is unknown.
fn match_qualitative(value: &str, ref_text: &str) -> (RiskLevel, Direction) {
    let result = value.trim().to_lowercase();
    let reference = ref_text.trim().to_lowercase();

    if result.is_empty() || reference.is_empty() {
        return (RiskLevel::Unknown, Direction::Unknown);
    }

    if reference.contains("negative") {
        if result.contains("positive") {
            return (RiskLevel::HighRisk, Direction::Positive);
        }
        if result.contains("negative") {
            return (RiskLevel::Normal, Direction::Normal);
        }
    }

    (RiskLevel::Unknown, Direction::Unknown)
}

/// Classify a single record.
pub fn classify_record(record: &RawTestRecord) -> ClassifiedResult {
    let (risk_level, direction) = Classification::of(record).evaluate();
    ClassifiedResult {
        record: record.clone(),
        risk_level,
        direction,
    }
}

/// Classify records in order, one result per record.
pub fn classify_records(records: &[RawTestRecord]) -> Vec<ClassifiedResult> {
    records.iter().map(classify_record).collect()
}
