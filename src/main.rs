use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use antenatal_lib::config::{AiConfig, APP_NAME, APP_VERSION};
use antenatal_lib::pipeline::analysis::{
    AnalysisRequest, BatchAlert, ReportAnalyzer, ReportCategory, ReportDocument, ReportType,
};
use antenatal_lib::report::{
    export_patient_summary, export_to_dir, read_reports_from_dir, AnalyzedReport,
    PatientRiskSummary,
};

#[derive(Parser)]
#[command(name = "antenatal")]
#[command(version, about = "Analyze antenatal lab reports and flag risk factors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more report files (PDF or plain text)
    Analyze {
        /// Report files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Report type code (e.g. cbc, blood-type, hiv, hepb, tsh)
        #[arg(long = "type")]
        report_type: Option<String>,
        /// Category used to pick a report type when --type is absent
        #[arg(long)]
        category: Option<String>,
        /// Patient identifier recorded in exports
        #[arg(long, default_value = "unknown")]
        patient_id: String,
        /// Report date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Free-text notes recorded in exports
        #[arg(long)]
        notes: Option<String>,
        /// Directory to write one JSON export per successfully analyzed file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Roll up a patient's exported analyses into one risk summary
    Summarize {
        /// Directory holding report exports from `analyze --out`
        dir: PathBuf,
        /// Patient whose reports are included
        #[arg(long, default_value = "unknown")]
        patient_id: String,
        /// Directory to write `patient_{id}_summary.json` into
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show how a report type code is interpreted
    Describe {
        /// Report type code
        code: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    antenatal_lib::init_tracing();

    let cli = Cli::parse();
    tracing::debug!("{} v{}", APP_NAME, APP_VERSION);

    match cli.command {
        Commands::Analyze {
            files,
            report_type,
            category,
            patient_id,
            date,
            notes,
            out,
        } => {
            let report_type = resolve_report_type(report_type, category)?;
            let report_date = date.unwrap_or_else(|| Local::now().date_naive());

            let config = AiConfig::from_env().context("reading AI configuration")?;
            let analyzer =
                ReportAnalyzer::from_config(&config).context("creating AI client")?;

            let mut documents = Vec::with_capacity(files.len());
            for path in &files {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                documents.push(ReportDocument::new(path.display().to_string(), bytes));
            }

            let request = AnalysisRequest::new(&report_type, &patient_id, Some(report_date));
            let outcome = analyzer.analyze_batch(&documents, &request);

            for entry in &outcome.entries {
                println!("{}", serde_json::to_string_pretty(&entry.summary)?);

                if let (Some(dir), true) = (&out, entry.summary.is_success()) {
                    let report = AnalyzedReport::new(
                        &report_type,
                        report_date,
                        &patient_id,
                        notes.clone(),
                        entry.summary.clone(),
                    );
                    let path = export_to_dir(dir, &report)
                        .with_context(|| format!("exporting analysis of {}", entry.name))?;
                    eprintln!("{}: exported to {}", entry.name, path.display());
                }
            }

            match outcome.alert() {
                BatchAlert::HighRisk => eprintln!(
                    "High risk factors detected: {} finding(s) across {} report(s).",
                    outcome.high_risk_findings, outcome.succeeded
                ),
                BatchAlert::Borderline => eprintln!(
                    "Borderline results detected: {} finding(s) across {} report(s).",
                    outcome.borderline_findings, outcome.succeeded
                ),
                BatchAlert::Clear => {
                    eprintln!("{} report(s) analyzed, no risk factors found.", outcome.succeeded)
                }
                BatchAlert::NothingAnalyzed => bail!("no report could be analyzed"),
            }
        }
        Commands::Summarize {
            dir,
            patient_id,
            out,
        } => {
            let reports = read_reports_from_dir(&dir)
                .with_context(|| format!("reading reports from {}", dir.display()))?;
            let summary = PatientRiskSummary::from_reports(&patient_id, &reports);
            if summary.reports_included == 0 {
                bail!("no analyzed reports for patient '{patient_id}' in {}", dir.display());
            }

            println!("{}", serde_json::to_string_pretty(&summary)?);
            if let Some(out) = out {
                let path = export_patient_summary(&out, &summary)
                    .context("exporting patient summary")?;
                eprintln!("summary exported to {}", path.display());
            }
        }
        Commands::Describe { code } => {
            let rt = ReportType::parse(&code);
            println!("code:        {}", rt.code());
            println!("description: {}", rt.description());
            println!("category:    {}", rt.category().as_str());
            if let Some(clause) = rt.extraction_clause() {
                println!("extraction instructions:\n{clause}");
            }
        }
    }

    Ok(())
}

fn resolve_report_type(
    report_type: Option<String>,
    category: Option<String>,
) -> anyhow::Result<String> {
    match (report_type, category) {
        (Some(rt), _) => Ok(rt),
        (None, Some(cat)) => match ReportCategory::parse(&cat) {
            Some(category) => Ok(category.default_report_type().to_string()),
            None => bail!(
                "unknown category '{cat}' (expected blood, ultrasound, infectious, thyroid or other)"
            ),
        },
        (None, None) => Ok(ReportCategory::Other.default_report_type().to_string()),
    }
}
