//! Coverage reconciliation: join the feature registry against evidence.
//!
//! `covered` counts automated features whose E2E case has evidence.
//! `missing` lists every feature that is not covered, including
//! non-automated ones, so `missing.len()` may exceed `total - covered`.
//! Only `covered` is scored; `missing` is informational.

use crate::evidence::EvidenceSet;
use crate::registry::FeatureRecord;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

pub const DEFAULT_THRESHOLD: f64 = 0.90;

/// Outcome of the coverage gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Process exit status for this verdict.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    pub covered: usize,
    pub total: usize,
    pub ratio: f64,
    pub threshold: f64,
    /// Uncovered features in registry order.
    pub missing: Vec<FeatureRecord>,
    pub source: String,
    pub found_cases: BTreeSet<String>,
    pub case_locations: BTreeMap<String, Vec<String>>,
}

impl CoverageReport {
    pub fn verdict(&self) -> Verdict {
        if self.ratio >= self.threshold {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// Missing features that claim automation: the actionable regressions.
    pub fn missing_automated(&self) -> impl Iterator<Item = &FeatureRecord> {
        self.missing.iter().filter(|feature| feature.automated)
    }
}

/// Compute the coverage report. Pure; `ratio` is `0.0` for an empty registry.
pub fn reconcile(
    features: &[FeatureRecord],
    evidence: &EvidenceSet,
    threshold: f64,
) -> CoverageReport {
    let mut covered = 0usize;
    let mut missing = Vec::new();

    for feature in features {
        if feature.automated && evidence.contains(&feature.e2e_case_id) {
            covered += 1;
        } else {
            missing.push(feature.clone());
        }
    }

    let total = features.len();
    let ratio = if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    };

    let report = CoverageReport {
        covered,
        total,
        ratio,
        threshold,
        missing,
        source: evidence.source().to_string(),
        found_cases: evidence.cases().clone(),
        case_locations: evidence.locations().clone(),
    };

    info!(
        covered,
        total,
        ratio,
        threshold,
        source = %report.source,
        verdict = ?report.verdict(),
        "coverage reconciled"
    );
    report
}
