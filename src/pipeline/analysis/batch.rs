use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use serde::{Deserialize, Serialize};

use super::orchestrator::{AnalysisRequest, ReportAnalyzer, MSG_FAILURE_PREFIX};
use super::types::AnalysisSummary;

/// An uploaded file awaiting analysis.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ReportDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub name: String,
    pub summary: AnalysisSummary,
}

/// What the upload screen tells the patient after a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAlert {
    HighRisk,
    Borderline,
    Clear,
    NothingAnalyzed,
}

/// Per-file summaries (input order) plus batch tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub entries: Vec<BatchEntry>,
    pub succeeded: usize,
    pub failed: usize,
    pub high_risk_findings: usize,
    pub borderline_findings: usize,
}

impl BatchOutcome {
    pub fn from_entries(entries: Vec<BatchEntry>) -> Self {
        let mut outcome = Self {
            entries: Vec::new(),
            succeeded: 0,
            failed: 0,
            high_risk_findings: 0,
            borderline_findings: 0,
        };
        for entry in &entries {
            if entry.summary.is_success() {
                outcome.succeeded += 1;
                outcome.high_risk_findings += entry.summary.high_risk_results;
                outcome.borderline_findings += entry.summary.borderline_results;
            } else {
                outcome.failed += 1;
            }
        }
        outcome.entries = entries;
        outcome
    }

    pub fn alert(&self) -> BatchAlert {
        if self.succeeded == 0 {
            BatchAlert::NothingAnalyzed
        } else if self.high_risk_findings > 0 {
            BatchAlert::HighRisk
        } else if self.borderline_findings > 0 {
            BatchAlert::Borderline
        } else {
            BatchAlert::Clear
        }
    }
}

impl ReportAnalyzer {
    /// Analyze several documents of the same report type. At most
    /// `max_concurrent` documents are in flight at once; workers pull the
    /// next document from a shared cursor. One failure does not affect the
    /// others, and entries come back in input order.
    pub fn analyze_batch(
        &self,
        documents: &[ReportDocument],
        request: &AnalysisRequest,
    ) -> BatchOutcome {
        let span = tracing::info_span!(
            "analyze_batch",
            report_type = %request.report_type,
            documents = documents.len(),
            workers = self.max_concurrent.min(documents.len())
        );
        let _guard = span.enter();

        let workers = self.max_concurrent.min(documents.len()).max(1);
        let cursor = AtomicUsize::new(0);

        let analyzed: Vec<(usize, AnalysisSummary)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let span = span.clone();
                    let cursor = &cursor;
                    scope.spawn(move || {
                        let _guard = span.enter();
                        let mut done = Vec::new();
                        loop {
                            let index = cursor.fetch_add(1, Ordering::Relaxed);
                            let Some(doc) = documents.get(index) else {
                                break;
                            };
                            done.push((index, self.analyze_isolated(doc, request)));
                        }
                        done
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap_or_default())
                .collect()
        });

        let mut slots: Vec<Option<AnalysisSummary>> = vec![None; documents.len()];
        for (index, summary) in analyzed {
            slots[index] = Some(summary);
        }

        let entries = documents
            .iter()
            .zip(slots)
            .map(|(doc, slot)| BatchEntry {
                name: doc.name.clone(),
                summary: slot.unwrap_or_else(aborted_summary),
            })
            .collect();

        let outcome = BatchOutcome::from_entries(entries);
        tracing::info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            high_risk = outcome.high_risk_findings,
            borderline = outcome.borderline_findings,
            "Batch analyzed"
        );
        outcome
    }

    /// A panic while analyzing one document becomes that document's error
    /// summary.
    fn analyze_isolated(&self, doc: &ReportDocument, request: &AnalysisRequest) -> AnalysisSummary {
        panic::catch_unwind(AssertUnwindSafe(|| self.analyze_report(&doc.bytes, request)))
            .unwrap_or_else(|_| {
                tracing::error!(document = %doc.name, "Analysis panicked");
                aborted_summary()
            })
    }
}

fn aborted_summary() -> AnalysisSummary {
    AnalysisSummary::error(format!("{MSG_FAILURE_PREFIX}analysis aborted unexpectedly"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::pipeline::analysis::adapter::RecordExtractor;
    use crate::pipeline::analysis::llm::MockLlmClient;
    use crate::pipeline::analysis::orchestrator::{MSG_NO_RESULTS, MSG_NO_TEXT};
    use crate::pipeline::analysis::types::LlmClient;
    use crate::pipeline::analysis::AnalysisError;
    use crate::pipeline::extraction::PlainTextExtractor;

    const RESPONSE: &str = r#"[
        {"test_name": "HIV Result", "result_value": "Positive", "ref_range_text": "Negative"},
        {"test_name": "Hemoglobin", "result_value": "12.5", "ref_range_low": "13.0", "ref_range_high": "17.0"}
    ]"#;

    fn analyzer(response: &str) -> ReportAnalyzer {
        ReportAnalyzer::new(
            Box::new(PlainTextExtractor),
            RecordExtractor::new(Box::new(MockLlmClient::new(response)), "m"),
        )
    }

    /// Tracks how many `generate` calls overlap.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    struct SlowClient(Arc<InFlight>);

    impl LlmClient for SlowClient {
        fn generate(&self, _model: &str, prompt: &str, _system: &str) -> Result<String, AnalysisError> {
            let now = self.0.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.0.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(25));
            self.0.current.fetch_sub(1, Ordering::SeqCst);
            self.0.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains("explode") {
                panic!("client blew up");
            }
            Ok(RESPONSE.to_string())
        }
    }

    fn slow_analyzer(stats: &Arc<InFlight>) -> ReportAnalyzer {
        ReportAnalyzer::new(
            Box::new(PlainTextExtractor),
            RecordExtractor::new(Box::new(SlowClient(Arc::clone(stats))), "m"),
        )
    }

    fn text_docs(count: usize) -> Vec<ReportDocument> {
        (0..count)
            .map(|i| ReportDocument::new(format!("report-{i}.txt"), format!("HIV screen {i}").into_bytes()))
            .collect()
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new("hiv", "patient-001", None)
    }

    #[test]
    fn batch_keeps_input_order_and_tallies() {
        let docs = vec![
            ReportDocument::new("first.txt", b"HIV reactive".to_vec()),
            ReportDocument::new("broken.bin", vec![0xFF, 0xFE, 0x00]),
            ReportDocument::new("third.txt", b"Hb 12.5".to_vec()),
        ];
        let outcome = analyzer(RESPONSE).analyze_batch(&docs, &request());

        let names: Vec<&str> = outcome.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["first.txt", "broken.bin", "third.txt"]);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.high_risk_findings, 2);
        assert_eq!(outcome.borderline_findings, 2);
        assert_eq!(outcome.entries[1].summary.message.as_deref(), Some(MSG_NO_TEXT));
        assert_eq!(outcome.alert(), BatchAlert::HighRisk);
    }

    #[test]
    fn empty_batch_analyzes_nothing() {
        let outcome = analyzer(RESPONSE).analyze_batch(&[], &request());
        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.alert(), BatchAlert::NothingAnalyzed);
    }

    #[test]
    fn all_failures_analyze_nothing() {
        let docs = vec![ReportDocument::new("a.txt", b"text".to_vec())];
        let outcome = analyzer("no array here").analyze_batch(&docs, &request());
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.entries[0].summary.message.as_deref(), Some(MSG_NO_RESULTS));
        assert_eq!(outcome.alert(), BatchAlert::NothingAnalyzed);
    }

    #[test]
    fn alert_levels() {
        let ok = |high, borderline| {
            let mut summary = AnalysisSummary::error("");
            summary.status = crate::pipeline::analysis::types::AnalysisStatus::Success;
            summary.message = None;
            summary.high_risk_results = high;
            summary.borderline_results = borderline;
            BatchEntry {
                name: "r".into(),
                summary,
            }
        };
        assert_eq!(BatchOutcome::from_entries(vec![ok(0, 0)]).alert(), BatchAlert::Clear);
        assert_eq!(
            BatchOutcome::from_entries(vec![ok(0, 0), ok(0, 3)]).alert(),
            BatchAlert::Borderline
        );
        assert_eq!(
            BatchOutcome::from_entries(vec![ok(0, 3), ok(1, 0)]).alert(),
            BatchAlert::HighRisk
        );
    }

    #[test]
    fn batch_is_sequential_by_default() {
        let stats = Arc::new(InFlight::default());
        let outcome = slow_analyzer(&stats).analyze_batch(&text_docs(6), &request());

        assert_eq!(outcome.succeeded, 6);
        assert_eq!(stats.calls.load(Ordering::SeqCst), 6);
        assert_eq!(stats.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn batch_never_exceeds_concurrency_limit() {
        let stats = Arc::new(InFlight::default());
        let docs = text_docs(24);
        let outcome = slow_analyzer(&stats)
            .with_max_concurrent(3)
            .analyze_batch(&docs, &request());

        assert_eq!(outcome.succeeded, 24);
        assert_eq!(stats.calls.load(Ordering::SeqCst), 24);
        let peak = stats.peak.load(Ordering::SeqCst);
        assert!((1..=3).contains(&peak), "peak in-flight calls: {peak}");

        let names: Vec<&str> = outcome.entries.iter().map(|e| e.name.as_str()).collect();
        let expected: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn zero_limit_still_analyzes() {
        let stats = Arc::new(InFlight::default());
        let outcome = slow_analyzer(&stats)
            .with_max_concurrent(0)
            .analyze_batch(&text_docs(2), &request());
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(stats.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_document_does_not_sink_the_batch() {
        let stats = Arc::new(InFlight::default());
        let docs = vec![
            ReportDocument::new("a.txt", b"HIV screen".to_vec()),
            ReportDocument::new("b.txt", b"explode".to_vec()),
            ReportDocument::new("c.txt", b"HIV screen".to_vec()),
        ];
        let outcome = slow_analyzer(&stats)
            .with_max_concurrent(2)
            .analyze_batch(&docs, &request());

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        let message = outcome.entries[1].summary.message.as_deref().unwrap();
        assert!(message.starts_with(MSG_FAILURE_PREFIX));
        assert!(outcome.entries[2].summary.is_success());
    }
}
