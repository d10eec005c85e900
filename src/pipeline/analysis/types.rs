use serde::{Deserialize, Deserializer, Serialize};

use super::AnalysisError;

/// One test parameter as the AI service reported it.
///
/// Every field is a string and missing fields are empty, so classification
/// never has to deal with absent data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTestRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub test_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub result_value: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub result_unit: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ref_range_low: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ref_range_high: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ref_range_text: String,
}

impl RawTestRecord {
    /// Build a quantitative record. Convenience for callers and tests.
    pub fn numeric(name: &str, value: &str, low: &str, high: &str) -> Self {
        Self {
            test_name: name.to_string(),
            result_value: value.to_string(),
            ref_range_low: low.to_string(),
            ref_range_high: high.to_string(),
            ..Self::default()
        }
    }

    /// Build a qualitative record with a textual reference.
    pub fn qualitative(name: &str, value: &str, ref_text: &str) -> Self {
        Self {
            test_name: name.to_string(),
            result_value: value.to_string(),
            ref_range_text: ref_text.to_string(),
            ..Self::default()
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.result_unit = unit.to_string();
        self
    }
}

/// Accept strings, numbers, booleans or null and render them as text.
/// Models frequently emit `13.0` where a string was asked for.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Primary classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Normal,
    Borderline,
    HighRisk,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Borderline => "borderline",
            Self::HighRisk => "high_risk",
            Self::Unknown => "unknown",
        }
    }

    /// Borderline and high-risk results are surfaced as risk factors.
    pub fn is_risk_factor(&self) -> bool {
        matches!(self, Self::Borderline | Self::HighRisk)
    }
}

/// How a result deviates from its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    High,
    Low,
    Normal,
    Positive,
    Indeterminate,
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Positive => "positive",
            Self::Indeterminate => "indeterminate",
            Self::Unknown => "unknown",
        }
    }
}

/// A raw record plus its risk level and direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedResult {
    #[serde(flatten)]
    pub record: RawTestRecord,
    pub risk_level: RiskLevel,
    pub direction: Direction,
}

/// A borderline or high-risk result, flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub test_name: String,
    pub result_value: String,
    pub result_unit: String,
    pub reference_range: String,
    pub risk_level: RiskLevel,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Success,
    Error,
}

/// Terminal artifact of one report analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(default)]
    pub total_tests: usize,
    #[serde(default)]
    pub normal_results: usize,
    #[serde(default)]
    pub borderline_results: usize,
    #[serde(default)]
    pub high_risk_results: usize,
    #[serde(default)]
    pub unknown_results: usize,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub all_results: Vec<ClassifiedResult>,
}

impl AnalysisSummary {
    /// Error summary: no counts, no results, just the message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Error,
            message: Some(message.into()),
            report_type: None,
            total_tests: 0,
            normal_results: 0,
            borderline_results: 0,
            high_risk_results: 0,
            unknown_results: 0,
            risk_factors: Vec::new(),
            all_results: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AnalysisStatus::Success
    }
}

/// Generative text service abstraction (allows mocking).
pub trait LlmClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let record: RawTestRecord =
            serde_json::from_str(r#"{"test_name": "HIV Result", "result_value": "Negative"}"#)
                .unwrap();
        assert_eq!(record.test_name, "HIV Result");
        assert_eq!(record.result_unit, "");
        assert_eq!(record.ref_range_low, "");
        assert_eq!(record.ref_range_text, "");
    }

    #[test]
    fn numbers_and_nulls_become_strings() {
        let record: RawTestRecord = serde_json::from_str(
            r#"{"test_name": "Hemoglobin", "result_value": 12.5, "result_unit": null,
                "ref_range_low": 13, "ref_range_high": 17.0, "ref_range_text": false}"#,
        )
        .unwrap();
        assert_eq!(record.result_value, "12.5");
        assert_eq!(record.result_unit, "");
        assert_eq!(record.ref_range_low, "13");
        assert_eq!(record.ref_range_high, "17.0");
        assert_eq!(record.ref_range_text, "false");
    }

    #[test]
    fn nested_values_are_dropped() {
        let record: RawTestRecord =
            serde_json::from_str(r#"{"test_name": ["a"], "result_value": {"v": 1}}"#).unwrap();
        assert_eq!(record.test_name, "");
        assert_eq!(record.result_value, "");
    }

    #[test]
    fn classified_result_serializes_flat() {
        let classified = ClassifiedResult {
            record: RawTestRecord::numeric("Hemoglobin", "12.5", "13.0", "17.0"),
            risk_level: RiskLevel::Borderline,
            direction: Direction::Low,
        };
        let json = serde_json::to_value(&classified).unwrap();
        assert_eq!(json["test_name"], "Hemoglobin");
        assert_eq!(json["ref_range_low"], "13.0");
        assert_eq!(json["risk_level"], "borderline");
        assert_eq!(json["direction"], "low");
    }

    #[test]
    fn error_summary_omits_report_type() {
        let summary = AnalysisSummary::error("Could not extract text from the uploaded file.");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Could not extract text from the uploaded file.");
        assert!(json.get("report_type").is_none());
        assert!(!summary.is_success());
    }

    #[test]
    fn risk_level_wire_names() {
        assert_eq!(serde_json::to_string(&RiskLevel::HighRisk).unwrap(), "\"high_risk\"");
        assert_eq!(RiskLevel::HighRisk.as_str(), "high_risk");
        assert!(RiskLevel::Borderline.is_risk_factor());
        assert!(!RiskLevel::Unknown.is_risk_factor());
    }
}
