//! Run configuration.
//!
//! Every path the kernel touches comes from a [`CheckConfig`]. The defaults
//! describe the usual project layout; relative paths are resolved against
//! `repo_root`, so tests can point a config at a temporary tree.

use crate::error::{FeatcovError, Result};
use crate::evidence::{EvidencePolicy, LogSpec};
use crate::marker::{DEFAULT_MARKER, MarkerPattern};
use crate::reconcile::DEFAULT_THRESHOLD;
use crate::table::{TableMatcher, TableSchema};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_DOCUMENT: &str = "docs/功能说明与E2E.md";
pub const DEFAULT_LOG: &str = ".e2e.log";
pub const DEFAULT_ROOTS: [&str; 1] = ["Culler"];
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["swift", "m", "mm"];

#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub repo_root: PathBuf,
    pub document: PathBuf,
    pub log: PathBuf,
    /// Set when the log path was named by the caller rather than defaulted.
    pub log_explicit: bool,
    pub roots: Vec<PathBuf>,
    pub extensions: BTreeSet<String>,
    pub threshold: f64,
    pub policy: EvidencePolicy,
    pub schema: TableSchema,
    pub marker: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            document: PathBuf::from(DEFAULT_DOCUMENT),
            log: PathBuf::from(DEFAULT_LOG),
            log_explicit: false,
            roots: DEFAULT_ROOTS.iter().map(PathBuf::from).collect(),
            extensions: normalize_extensions(DEFAULT_EXTENSIONS),
            threshold: DEFAULT_THRESHOLD,
            policy: EvidencePolicy::default(),
            schema: TableSchema::default(),
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

/// Compiled matchers and resolved paths for one run.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Absolute form of `CheckConfig::repo_root`.
    pub repo_root: PathBuf,
    pub document: PathBuf,
    pub log: LogSpec,
    pub roots: Vec<PathBuf>,
    pub table: TableMatcher,
    pub marker: MarkerPattern,
}

impl CheckConfig {
    /// `path` as-is when absolute, otherwise under `repo_root`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.repo_root.join(path)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(FeatcovError::InvalidConfig(format!(
                "threshold must be a finite number, got {}",
                self.threshold
            )));
        }
        if self.roots.is_empty() {
            return Err(FeatcovError::InvalidConfig(
                "at least one scan root is required".to_string(),
            ));
        }
        if self.extensions.is_empty() || self.extensions.iter().any(String::is_empty) {
            return Err(FeatcovError::InvalidConfig(
                "scan extensions must be a non-empty list of non-empty names".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate, compile matchers, and resolve every path.
    ///
    /// `repo_root` is made absolute first, so reported paths stay relative
    /// to it even when a root or log is given as an absolute path.
    pub fn prepare(&self) -> Result<Prepared> {
        self.validate()?;
        let repo_root = absolutize(&self.repo_root)?;
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                repo_root.join(path)
            }
        };
        Ok(Prepared {
            document: resolve(&self.document),
            log: LogSpec {
                path: resolve(&self.log),
                explicit: self.log_explicit,
            },
            roots: self.roots.iter().map(|root| resolve(root)).collect(),
            table: self.schema.compile()?,
            marker: MarkerPattern::new(&self.marker, &self.schema.case_prefix)?,
            repo_root,
        })
    }
}

/// `path` joined onto the working directory when relative, with `.`
/// components dropped.
fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|err| {
                FeatcovError::InvalidConfig(format!(
                    "cannot resolve repo root {}: {err}",
                    path.display()
                ))
            })?
            .join(path)
    };
    Ok(joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}

/// Extension set with any leading dots removed.
pub fn normalize_extensions<I, S>(extensions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_string())
        .collect()
}
