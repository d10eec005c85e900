use chrono::NaiveDate;

use super::adapter::RecordExtractor;
use super::classify::classify_records;
use super::summary::summarize;
use super::types::AnalysisSummary;
use super::AnalysisError;
use crate::config::AiConfig;
use crate::pipeline::extraction::{DocumentTextExtractor, TextExtractor};

pub const MSG_NO_TEXT: &str = "Could not extract text from the uploaded file.";
pub const MSG_NO_RESULTS: &str = "Could not extract test results from the report.";
pub const MSG_FAILURE_PREFIX: &str = "An error occurred while analyzing the report: ";

/// Identifies what is being analyzed. Patient id and date are carried for
/// the caller; they do not influence classification.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub report_type: String,
    pub patient_id: String,
    pub report_date: Option<NaiveDate>,
}

impl AnalysisRequest {
    pub fn new(report_type: &str, patient_id: &str, report_date: Option<NaiveDate>) -> Self {
        Self {
            report_type: report_type.to_string(),
            patient_id: patient_id.to_string(),
            report_date,
        }
    }
}

/// Runs one report through the pipeline:
/// extract text → AI extraction → classify → summarize
pub struct ReportAnalyzer {
    text_extractor: Box<dyn TextExtractor + Send + Sync>,
    records: RecordExtractor,
    pub(crate) max_concurrent: usize,
}

impl ReportAnalyzer {
    pub fn new(
        text_extractor: Box<dyn TextExtractor + Send + Sync>,
        records: RecordExtractor,
    ) -> Self {
        Self {
            text_extractor,
            records,
            max_concurrent: 1,
        }
    }

    /// Allow up to `limit` documents of a batch to be analyzed at once
    /// (at least one).
    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = limit.max(1);
        self
    }

    /// Analyzer with the default document extractor and the configured AI client.
    pub fn from_config(config: &AiConfig) -> Result<Self, AnalysisError> {
        let client = config.build_client()?;
        Ok(Self::new(
            Box::new(DocumentTextExtractor),
            RecordExtractor::new(client, &config.model),
        )
        .with_max_concurrent(config.max_concurrent_requests))
    }

    /// Analyze an uploaded document. Always returns a summary; failures are
    /// reported with `status: error`.
    pub fn analyze_report(&self, document: &[u8], request: &AnalysisRequest) -> AnalysisSummary {
        let _span = tracing::info_span!(
            "analyze_report",
            report_type = %request.report_type,
            report_date = ?request.report_date,
            bytes = document.len()
        )
        .entered();

        let text = match self.text_extractor.extract_text(document) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("Document contains no extractable text");
                return AnalysisSummary::error(MSG_NO_TEXT);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Text extraction failed");
                return AnalysisSummary::error(MSG_NO_TEXT);
            }
        };

        self.analyze_text(&text, &request.report_type)
    }

    /// Analyze report text that has already been extracted.
    pub fn analyze_text(&self, report_text: &str, report_type: &str) -> AnalysisSummary {
        if report_text.trim().is_empty() {
            return AnalysisSummary::error(MSG_NO_TEXT);
        }

        match self.try_analyze_text(report_text, report_type) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, report_type, "Report analysis failed");
                AnalysisSummary::error(format!("{MSG_FAILURE_PREFIX}{e}"))
            }
        }
    }

    fn try_analyze_text(
        &self,
        report_text: &str,
        report_type: &str,
    ) -> Result<AnalysisSummary, AnalysisError> {
        let records = self.records.extract_test_records(report_text, report_type)?;
        if records.is_empty() {
            tracing::warn!(report_type, "No test results extracted");
            return Ok(AnalysisSummary::error(MSG_NO_RESULTS));
        }

        let summary = summarize(classify_records(&records), report_type);
        tracing::info!(
            report_type,
            total_tests = summary.total_tests,
            risk_factors = summary.risk_factors.len(),
            high_risk = summary.high_risk_results,
            "Report analyzed"
        );
        Ok(summary)
    }
}
