use super::types::{AnalysisStatus, AnalysisSummary, ClassifiedResult, RiskFactor, RiskLevel};

/// `"{low}-{high}"` when both bounds are present, else the textual
/// reference, else `"N/A"`.
pub fn format_reference_range(result: &ClassifiedResult) -> String {
    let r = &result.record;
    if !r.ref_range_low.is_empty() && !r.ref_range_high.is_empty() {
        format!("{}-{}", r.ref_range_low, r.ref_range_high)
    } else if !r.ref_range_text.is_empty() {
        r.ref_range_text.clone()
    } else {
        "N/A".to_string()
    }
}

/// Borderline and high-risk results, in their original order.
pub fn collect_risk_factors(classified: &[ClassifiedResult]) -> Vec<RiskFactor> {
    classified
        .iter()
        .filter(|c| c.risk_level.is_risk_factor())
        .map(|c| RiskFactor {
            test_name: c.record.test_name.clone(),
            result_value: c.record.result_value.clone(),
            result_unit: c.record.result_unit.clone(),
            reference_range: format_reference_range(c),
            risk_level: c.risk_level,
            direction: c.direction,
        })
        .collect()
}

/// Tally classified results into a success summary.
pub fn summarize(classified: Vec<ClassifiedResult>, report_type: &str) -> AnalysisSummary {
    let mut normal = 0;
    let mut borderline = 0;
    let mut high_risk = 0;
    let mut unknown = 0;

    for result in &classified {
        match result.risk_level {
            RiskLevel::Normal => normal += 1,
            RiskLevel::Borderline => borderline += 1,
            RiskLevel::HighRisk => high_risk += 1,
            RiskLevel::Unknown => unknown += 1,
        }
    }

    AnalysisSummary {
        status: AnalysisStatus::Success,
        message: None,
        report_type: Some(report_type.to_string()),
        total_tests: classified.len(),
        normal_results: normal,
        borderline_results: borderline,
        high_risk_results: high_risk,
        unknown_results: unknown,
        risk_factors: collect_risk_factors(&classified),
        all_results: classified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::classify::classify_records;
    use crate::pipeline::analysis::types::{Direction, RawTestRecord};

    fn mixed_batch() -> Vec<ClassifiedResult> {
        classify_records(&[
            RawTestRecord::numeric("Hemoglobin", "12.5", "13.0", "17.0").with_unit("g/dL"),
            RawTestRecord::numeric("Platelets", "250", "150", "400"),
            RawTestRecord::qualitative("HIV Result", "Positive", "Negative"),
            RawTestRecord::qualitative("Blood Group", "A", "N/A"),
            RawTestRecord::numeric("GLUCOSE fasting", "315.0", "70.0", "100.0"),
            RawTestRecord::qualitative("Hepatitis B Result", "Negative", "Negative"),
        ])
    }

    #[test]
    fn counts_partition_total() {
        let summary = summarize(mixed_batch(), "cbc");
        assert_eq!(summary.status, AnalysisStatus::Success);
        assert_eq!(summary.report_type.as_deref(), Some("cbc"));
        assert_eq!(summary.total_tests, 6);
        assert_eq!(summary.normal_results, 2);
        assert_eq!(summary.borderline_results, 2);
        assert_eq!(summary.high_risk_results, 1);
        assert_eq!(summary.unknown_results, 1);
        assert_eq!(
            summary.normal_results
                + summary.borderline_results
                + summary.high_risk_results
                + summary.unknown_results,
            summary.total_tests
        );
    }

    #[test]
    fn risk_factors_are_borderline_or_high_risk_in_order() {
        let summary = summarize(mixed_batch(), "cbc");
        assert_eq!(
            summary.risk_factors.len(),
            summary.borderline_results + summary.high_risk_results
        );
        let names: Vec<&str> = summary.risk_factors.iter().map(|f| f.test_name.as_str()).collect();
        assert_eq!(names, vec!["Hemoglobin", "HIV Result", "GLUCOSE fasting"]);
        assert!(summary.risk_factors.iter().all(|f| f.risk_level.is_risk_factor()));
    }

    #[test]
    fn risk_factor_fields_are_copied() {
        let summary = summarize(mixed_batch(), "cbc");
        let hb = &summary.risk_factors[0];
        assert_eq!(hb.result_value, "12.5");
        assert_eq!(hb.result_unit, "g/dL");
        assert_eq!(hb.reference_range, "13.0-17.0");
        assert_eq!(hb.risk_level, RiskLevel::Borderline);
        assert_eq!(hb.direction, Direction::Low);

        let hiv = &summary.risk_factors[1];
        assert_eq!(hiv.reference_range, "Negative");
        assert_eq!(hiv.direction, Direction::Positive);
    }

    #[test]
    fn all_results_keep_extraction_order() {
        let batch = mixed_batch();
        let summary = summarize(batch.clone(), "cbc");
        assert_eq!(summary.all_results, batch);
    }

    #[test]
    fn reference_range_falls_back_to_na() {
        let only_low = classify_records(&[RawTestRecord::numeric("Ferritin", "8", "15", "")]);
        assert_eq!(format_reference_range(&only_low[0]), "N/A");

        let with_text = classify_records(&[RawTestRecord {
            ref_range_low: "15".into(),
            ref_range_text: "> 15".into(),
            ..RawTestRecord::default()
        }]);
        assert_eq!(format_reference_range(&with_text[0]), "> 15");
    }

    #[test]
    fn empty_input_summarizes_to_zero_counts() {
        let summary = summarize(Vec::new(), "tsh");
        assert_eq!(summary.total_tests, 0);
        assert!(summary.risk_factors.is_empty());
        assert!(summary.is_success());
    }
}
