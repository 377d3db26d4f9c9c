//! The coverage run: parse registry, collect evidence, reconcile.
//!
//! Each stage either succeeds completely or aborts the run; the gate is
//! only evaluated over a fully parsed registry and a complete evidence set.

use crate::config::{CheckConfig, Prepared};
use crate::error::Result;
use crate::evidence::{self, EvidenceRequest, EvidenceSet};
use crate::reconcile::{CoverageReport, reconcile};
use crate::registry::Registry;

pub fn load_registry(config: &CheckConfig) -> Result<Registry> {
    let prepared = config.prepare()?;
    Registry::load(&prepared.document, &prepared.table)
}

pub fn collect_evidence(config: &CheckConfig) -> Result<EvidenceSet> {
    let prepared = config.prepare()?;
    collect_prepared(config, &prepared)
}

/// Full check: registry and evidence, joined into a report.
pub fn run_check(config: &CheckConfig) -> Result<CoverageReport> {
    let prepared = config.prepare()?;
    let registry = Registry::load(&prepared.document, &prepared.table)?;
    let evidence = collect_prepared(config, &prepared)?;
    Ok(reconcile(registry.features(), &evidence, config.threshold))
}

fn collect_prepared(config: &CheckConfig, prepared: &Prepared) -> Result<EvidenceSet> {
    let request = EvidenceRequest {
        repo_root: &prepared.repo_root,
        log: &prepared.log,
        roots: &prepared.roots,
        extensions: &config.extensions,
        policy: config.policy,
    };
    evidence::collect(&request, &prepared.marker)
}
