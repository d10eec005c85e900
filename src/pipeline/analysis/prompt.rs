use super::describer::ReportType;

pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"
You are a medical data extraction AI. Your ONLY role is to list the test
parameters that are explicitly present in a lab or imaging report.

RULES:
1. Extract ONLY values written in the report. Never infer or interpret.
2. Preserve values, units and reference limits verbatim.
3. Output a single JSON array and nothing else.
"#;

/// Build the extraction prompt for one report.
pub fn build_extraction_prompt(report_text: &str, report_type: &ReportType) -> String {
    let description = report_type.description();

    let mut prompt = format!(
        r#"Analyze this {description} report and extract all test parameters, their values, and reference ranges.

Format the results as a JSON array where each item has these fields:
- test_name: The name of the test parameter
- result_value: The numeric value (if available) or text result (e.g., "Positive", "Negative", "A", "B")
- result_unit: The unit of measurement (if available, e.g., "%", "g/dL")
- ref_range_low: The lower limit of the reference range (numeric if available)
- ref_range_high: The upper limit of the reference range (numeric if available)
- ref_range_text: Text description of reference range (e.g., "Negative", "N/A")

For qualitative tests, use text values in result_value (e.g., "Positive", "Negative") and set ref_range_text appropriately.
"#
    );

    if let Some(clause) = report_type.extraction_clause() {
        prompt.push('\n');
        prompt.push_str(clause);
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        r#"
Report content:
<report>
{report_text}
</report>

Return ONLY the JSON array.
"#
    ));

    prompt
}
