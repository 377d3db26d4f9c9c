//! Report rendering: structured JSON and the human summary.

use crate::reconcile::{CoverageReport, Verdict};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Output mode for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Serialize)]
struct MissingEntry<'a> {
    id: &'a str,
    name: &'a str,
    e2e: &'a str,
    automated: bool,
}

#[derive(Debug, Serialize)]
struct ReportPayload<'a> {
    covered: usize,
    total: usize,
    coverage: f64,
    threshold: f64,
    passed: bool,
    source: &'a str,
    missing: Vec<MissingEntry<'a>>,
    found_cases: Vec<&'a str>,
    case_locations: &'a BTreeMap<String, Vec<String>>,
}

/// Structured report as a JSON value with a stable key set.
pub fn to_json(report: &CoverageReport) -> serde_json::Value {
    let payload = ReportPayload {
        covered: report.covered,
        total: report.total,
        coverage: report.ratio,
        threshold: report.threshold,
        passed: report.verdict() == Verdict::Pass,
        source: &report.source,
        missing: report
            .missing
            .iter()
            .map(|f| MissingEntry {
                id: &f.feature_id,
                name: &f.name,
                e2e: &f.e2e_case_id,
                automated: f.automated,
            })
            .collect(),
        found_cases: report.found_cases.iter().map(String::as_str).collect(),
        case_locations: &report.case_locations,
    };
    serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
}

/// Human summary: one coverage line, then the missing automated features.
///
/// Non-automated features are not listed; they are not regressions.
pub fn to_human(report: &CoverageReport) -> String {
    let mut out = format!(
        "E2E feature coverage: {}/{} = {:.1}% (threshold {:.0}%)",
        report.covered,
        report.total,
        report.ratio * 100.0,
        report.threshold * 100.0
    );
    let mut actionable = report.missing_automated().peekable();
    if actionable.peek().is_some() {
        out.push_str("\n\nMissing automated E2E cases:");
        for f in actionable {
            let _ = write!(
                out,
                "\n- {} {}: {} not found in tests",
                f.feature_id, f.name, f.e2e_case_id
            );
        }
    }
    out
}

/// Render `report` in `mode`. JSON is pretty-printed.
pub fn render(report: &CoverageReport, mode: OutputMode) -> Result<String, serde_json::Error> {
    match mode {
        OutputMode::Human => Ok(to_human(report)),
        OutputMode::Json => serde_json::to_string_pretty(&to_json(report)),
    }
}
