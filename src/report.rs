//! Analyzed-report record, the per-patient risk rollup, and their JSON
//! exports.
//!
//! The exports are the downloadable files the patient keeps; where they are
//! written is the caller's choice.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::analysis::{
    format_reference_range, AnalysisError, AnalysisSummary, Direction, ReportCategory,
    ReportType, RiskFactor, RiskLevel,
};

/// One analyzed upload, as kept alongside the patient's other reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedReport {
    pub id: Uuid,
    pub report_type: String,
    pub category: ReportCategory,
    pub report_date: NaiveDate,
    pub patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub analysis: AnalysisSummary,
}

impl AnalyzedReport {
    pub fn new(
        report_type: &str,
        report_date: NaiveDate,
        patient_id: &str,
        notes: Option<String>,
        analysis: AnalysisSummary,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_type: report_type.to_string(),
            category: ReportType::parse(report_type).category(),
            report_date,
            patient_id: patient_id.to_string(),
            notes: notes.filter(|n| !n.trim().is_empty()),
            analysis,
        }
    }

    /// `{report_type}_{date}_{short id}.json`
    pub fn export_file_name(&self) -> String {
        let code = file_name_component(ReportType::parse(&self.report_type).code());
        let id = self.id.simple().to_string();
        format!("{}_{}_{}.json", code, self.report_date.format("%Y-%m-%d"), &id[..8])
    }
}

/// Counts per risk bucket, summed across reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    pub normal: usize,
    pub borderline: usize,
    pub high_risk: usize,
    pub unknown: usize,
}

impl RiskCounts {
    pub fn total(&self) -> usize {
        self.normal + self.borderline + self.high_risk + self.unknown
    }

    fn add(&mut self, summary: &AnalysisSummary) {
        self.normal += summary.normal_results;
        self.borderline += summary.borderline_results;
        self.high_risk += summary.high_risk_results;
        self.unknown += summary.unknown_results;
    }
}

/// A classified result tagged with the report it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientTestResult {
    pub test_name: String,
    pub result_value: String,
    pub result_unit: String,
    pub reference_range: String,
    pub risk_level: RiskLevel,
    pub direction: Direction,
    pub report_id: Uuid,
    pub report_date: NaiveDate,
    pub report_type: String,
}

/// Risk overview across every successfully analyzed report of one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRiskSummary {
    pub patient_id: String,
    pub reports_included: usize,
    pub reports_skipped: usize,
    pub test_analysis: RiskCounts,
    pub risk_factors: Vec<RiskFactor>,
    pub all_test_results: Vec<PatientTestResult>,
    pub generated_at: DateTime<Utc>,
}

impl PatientRiskSummary {
    /// Roll up the given patient's reports in the order given. Reports of
    /// other patients are ignored; error summaries are counted as skipped
    /// and contribute nothing else.
    pub fn from_reports(patient_id: &str, reports: &[AnalyzedReport]) -> Self {
        let mut summary = Self {
            patient_id: patient_id.to_string(),
            reports_included: 0,
            reports_skipped: 0,
            test_analysis: RiskCounts::default(),
            risk_factors: Vec::new(),
            all_test_results: Vec::new(),
            generated_at: Utc::now(),
        };

        for report in reports.iter().filter(|r| r.patient_id == patient_id) {
            let analysis = &report.analysis;
            if !analysis.is_success() {
                summary.reports_skipped += 1;
                continue;
            }

            summary.reports_included += 1;
            summary.test_analysis.add(analysis);
            summary.risk_factors.extend(analysis.risk_factors.iter().cloned());
            summary
                .all_test_results
                .extend(analysis.all_results.iter().map(|result| PatientTestResult {
                    test_name: result.record.test_name.clone(),
                    result_value: result.record.result_value.clone(),
                    result_unit: result.record.result_unit.clone(),
                    reference_range: format_reference_range(result),
                    risk_level: result.risk_level,
                    direction: result.direction,
                    report_id: report.id,
                    report_date: report.report_date,
                    report_type: report.report_type.clone(),
                }));
        }

        tracing::debug!(
            included = summary.reports_included,
            skipped = summary.reports_skipped,
            total_tests = summary.test_analysis.total(),
            "Patient risk summary built"
        );
        summary
    }

    /// `patient_{id}_summary.json`
    pub fn export_file_name(&self) -> String {
        format!("patient_{}_summary.json", file_name_component(&self.patient_id))
    }
}

/// Lowercase `[a-z0-9-]` only; anything else becomes `-`.
fn file_name_component(raw: &str) -> String {
    let component: String = raw
        .trim()
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if component.is_empty() {
        "unknown".to_string()
    } else {
        component
    }
}

/// Serialize `value` as pretty JSON into a temporary file in the target
/// directory, then rename it into place.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AnalysisError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let json = serde_json::to_vec_pretty(value)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| AnalysisError::Io(e.error))?;
    Ok(())
}

/// Write a report as pretty JSON.
pub fn write_report_json(path: &Path, report: &AnalyzedReport) -> Result<(), AnalysisError> {
    write_json_atomic(path, report)?;
    tracing::info!(
        report_id = %report.id,
        path = %path.display(),
        "Analysis exported"
    );
    Ok(())
}

/// Write a report into `dir` under its export file name.
pub fn export_to_dir(dir: &Path, report: &AnalyzedReport) -> Result<PathBuf, AnalysisError> {
    let path = dir.join(report.export_file_name());
    write_report_json(&path, report)?;
    Ok(path)
}

/// Read a previously exported report.
pub fn read_report_json(path: &Path) -> Result<AnalyzedReport, AnalysisError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read every report export in `dir`, oldest report first. JSON files that
/// are not report exports (e.g. patient summaries) are skipped.
pub fn read_reports_from_dir(dir: &Path) -> Result<Vec<AnalyzedReport>, AnalysisError> {
    let mut reports = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match read_report_json(&path) {
            Ok(report) => reports.push(report),
            Err(AnalysisError::Json(e)) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping non-report JSON");
            }
            Err(e) => return Err(e),
        }
    }
    reports.sort_by(|a, b| (a.report_date, a.id).cmp(&(b.report_date, b.id)));
    Ok(reports)
}

/// Write a patient summary into `dir` under its export file name.
pub fn export_patient_summary(
    dir: &Path,
    summary: &PatientRiskSummary,
) -> Result<PathBuf, AnalysisError> {
    let path = dir.join(summary.export_file_name());
    write_json_atomic(&path, summary)?;
    tracing::info!(
        reports = summary.reports_included,
        path = %path.display(),
        "Patient summary exported"
    );
    Ok(path)
}
