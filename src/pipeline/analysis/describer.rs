use serde::{Deserialize, Serialize};

/// Description used for report codes we have no specific name for.
pub const GENERIC_DESCRIPTION: &str = "Medical Test";

const BLOOD_TYPE_CLAUSE: &str = r#"For Blood Typing reports, extract:
- Blood group (e.g., "A", "B", "AB", "O") as test_name: "Blood Group", result_value: [extracted group], ref_range_text: "N/A"
- Rh factor (e.g., "Positive", "Negative") as test_name: "Rh Factor", result_value: [extracted factor], ref_range_text: "N/A""#;

const HIV_CLAUSE: &str = r#"For HIV Test reports, extract the result as "Positive" or "Negative".
Set test_name: "HIV Result", result_value: [extracted result], ref_range_text: "Negative"."#;

const HEPB_CLAUSE: &str = r#"For Hepatitis B Test reports, extract the result as "Positive" or "Negative".
Set test_name: "Hepatitis B Result", result_value: [extracted result], ref_range_text: "Negative"."#;

/// Report type codes as chosen on upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportType {
    Cbc,
    BloodType,
    Glucose,
    Doppler,
    Ultrasound3d4d,
    Hiv,
    HepatitisB,
    Tsh,
    CellFreeDna,
    Carrier,
    Amniocentesis,
    Cvs,
    Custom,
    /// Any code without a dedicated description; keeps the normalized code.
    Other(String),
}

impl ReportType {
    /// Parse a report code, case-insensitively. Never fails.
    pub fn parse(code: &str) -> Self {
        let normalized = code.trim().to_lowercase();
        match normalized.as_str() {
            "cbc" => Self::Cbc,
            "blood-type" => Self::BloodType,
            "glucose" => Self::Glucose,
            "doppler" => Self::Doppler,
            "3d-4d" => Self::Ultrasound3d4d,
            "hiv" => Self::Hiv,
            "hepb" => Self::HepatitisB,
            "tsh" => Self::Tsh,
            "cfdna" => Self::CellFreeDna,
            "carrier" => Self::Carrier,
            "amnio" => Self::Amniocentesis,
            "cvs" => Self::Cvs,
            "custom" => Self::Custom,
            _ => Self::Other(normalized),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Cbc => "cbc",
            Self::BloodType => "blood-type",
            Self::Glucose => "glucose",
            Self::Doppler => "doppler",
            Self::Ultrasound3d4d => "3d-4d",
            Self::Hiv => "hiv",
            Self::HepatitisB => "hepb",
            Self::Tsh => "tsh",
            Self::CellFreeDna => "cfdna",
            Self::Carrier => "carrier",
            Self::Amniocentesis => "amnio",
            Self::Cvs => "cvs",
            Self::Custom => "custom",
            Self::Other(code) => code,
        }
    }

    /// Human-readable name used in the extraction prompt.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Cbc => "Complete Blood Count (CBC)",
            Self::BloodType => "Blood Typing",
            Self::Glucose => "Glucose Tolerance Test",
            Self::Doppler => "Doppler Ultrasound",
            Self::Ultrasound3d4d => "3D/4D Ultrasound",
            Self::Hiv => "HIV Test",
            Self::HepatitisB => "Hepatitis B Test",
            Self::Tsh => "Thyroid Function Test",
            Self::CellFreeDna => "Cell-Free DNA Screening",
            Self::Carrier => "Carrier Screening",
            Self::Amniocentesis => "Amniocentesis Results",
            Self::Cvs => "Chorionic Villus Sampling (CVS) Results",
            Self::Custom | Self::Other(_) => GENERIC_DESCRIPTION,
        }
    }

    /// Type-specific extraction instructions appended to the prompt.
    pub fn extraction_clause(&self) -> Option<&'static str> {
        match self {
            Self::BloodType => Some(BLOOD_TYPE_CLAUSE),
            Self::Hiv => Some(HIV_CLAUSE),
            Self::HepatitisB => Some(HEPB_CLAUSE),
            _ => None,
        }
    }

    /// Upload tab the report belongs to.
    pub fn category(&self) -> ReportCategory {
        match self {
            Self::Cbc | Self::BloodType | Self::Glucose => ReportCategory::Blood,
            Self::Doppler | Self::Ultrasound3d4d => ReportCategory::Ultrasound,
            Self::Hiv | Self::HepatitisB => ReportCategory::Infectious,
            Self::Tsh => ReportCategory::Thyroid,
            Self::CellFreeDna
            | Self::Carrier
            | Self::Amniocentesis
            | Self::Cvs
            | Self::Custom => ReportCategory::Other,
            Self::Other(code) => match code.as_str() {
                "hemoglobin" | "platelet" => ReportCategory::Blood,
                "dating" | "anatomy" | "growth" | "nt-scan" => ReportCategory::Ultrasound,
                "hep-c" | "syphilis" | "rubella" => ReportCategory::Infectious,
                "t3" | "t4" => ReportCategory::Thyroid,
                _ => ReportCategory::Other,
            },
        }
    }
}

/// Grouping of report types on the upload screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    Blood,
    Ultrasound,
    Infectious,
    Thyroid,
    Other,
}

impl ReportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blood => "blood",
            Self::Ultrasound => "ultrasound",
            Self::Infectious => "infectious",
            Self::Thyroid => "thyroid",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "blood" => Some(Self::Blood),
            "ultrasound" => Some(Self::Ultrasound),
            "infectious" => Some(Self::Infectious),
            "thyroid" => Some(Self::Thyroid),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Report type preselected when a category is chosen.
    pub fn default_report_type(&self) -> &'static str {
        match self {
            Self::Blood => "cbc",
            Self::Ultrasound => "dating",
            Self::Infectious => "hiv",
            Self::Thyroid => "tsh",
            Self::Other => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ReportType::parse("HIV"), ReportType::Hiv);
        assert_eq!(ReportType::parse(" Blood-Type "), ReportType::BloodType);
        assert_eq!(ReportType::parse("3D-4D"), ReportType::Ultrasound3d4d);
    }

    #[test]
    fn known_codes_have_descriptions() {
        assert_eq!(ReportType::parse("cbc").description(), "Complete Blood Count (CBC)");
        assert_eq!(ReportType::parse("tsh").description(), "Thyroid Function Test");
        assert_eq!(
            ReportType::parse("cvs").description(),
            "Chorionic Villus Sampling (CVS) Results"
        );
    }

    #[test]
    fn unknown_code_degrades_to_generic() {
        let rt = ReportType::parse("Lipid-Panel");
        assert_eq!(rt, ReportType::Other("lipid-panel".into()));
        assert_eq!(rt.description(), GENERIC_DESCRIPTION);
        assert!(rt.extraction_clause().is_none());
        assert_eq!(rt.code(), "lipid-panel");
    }

    #[test]
    fn bespoke_clauses_only_for_three_types() {
        let blood = ReportType::BloodType.extraction_clause().unwrap();
        assert!(blood.contains("Blood Group"));
        assert!(blood.contains("Rh Factor"));

        let hiv = ReportType::Hiv.extraction_clause().unwrap();
        assert!(hiv.contains("HIV Result"));
        assert!(hiv.contains(r#"ref_range_text: "Negative""#));

        let hepb = ReportType::HepatitisB.extraction_clause().unwrap();
        assert!(hepb.contains("Hepatitis B Result"));

        assert!(ReportType::Cbc.extraction_clause().is_none());
        assert!(ReportType::Custom.extraction_clause().is_none());
    }

    #[test]
    fn categories_follow_upload_tabs() {
        assert_eq!(ReportType::parse("glucose").category(), ReportCategory::Blood);
        assert_eq!(ReportType::parse("hemoglobin").category(), ReportCategory::Blood);
        assert_eq!(ReportType::parse("doppler").category(), ReportCategory::Ultrasound);
        assert_eq!(ReportType::parse("hep-c").category(), ReportCategory::Infectious);
        assert_eq!(ReportType::parse("t4").category(), ReportCategory::Thyroid);
        assert_eq!(ReportType::parse("amnio").category(), ReportCategory::Other);
        assert_eq!(ReportType::parse("whatever").category(), ReportCategory::Other);
    }

    #[test]
    fn category_default_types_round_trip() {
        for category in [
            ReportCategory::Blood,
            ReportCategory::Ultrasound,
            ReportCategory::Infectious,
            ReportCategory::Thyroid,
            ReportCategory::Other,
        ] {
            let rt = ReportType::parse(category.default_report_type());
            assert_eq!(rt.category(), category);
            assert_eq!(ReportCategory::parse(category.as_str()), Some(category));
        }
    }
}
