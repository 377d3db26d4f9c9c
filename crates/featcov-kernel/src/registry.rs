//! Feature registry: the canonical, ordered set of feature records parsed
//! from the feature document.

use crate::error::{FeatcovError, Result};
use crate::table::{TableMatcher, is_table_line};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// One row of the feature registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureRecord {
    pub feature_id: String,
    pub name: String,
    pub e2e_case_id: String,
    pub automated: bool,
}

/// Feature records in document order, indexable by feature id.
///
/// When the document repeats a feature id, the first row wins; later rows
/// are dropped and their ids kept in [`Registry::duplicates`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    features: Vec<FeatureRecord>,
    index: BTreeMap<String, usize>,
    duplicates: Vec<String>,
}

impl Registry {
    /// Parse registry text. `origin` only labels errors.
    pub fn parse(text: &str, matcher: &TableMatcher, origin: &Path) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let Some(header_idx) = lines.iter().position(|line| matcher.header_matches(line)) else {
            return Err(FeatcovError::MissingTableHeader {
                path: origin.to_path_buf(),
            });
        };

        let mut registry = Registry::default();
        let mut skipped = 0usize;
        // header + separator row
        for line in lines.iter().skip(header_idx + 2) {
            if !is_table_line(line) {
                break;
            }
            match matcher.parse_row(line) {
                Some(row) => registry.insert(FeatureRecord {
                    feature_id: row.feature_id,
                    name: row.name,
                    e2e_case_id: row.e2e_case_id,
                    automated: row.automated,
                }),
                None => skipped += 1,
            }
        }

        if registry.is_empty() {
            return Err(FeatcovError::EmptyRegistry {
                path: origin.to_path_buf(),
            });
        }

        debug!(
            document = %origin.display(),
            header_line = header_idx + 1,
            features = registry.len(),
            skipped_rows = skipped,
            duplicates = registry.duplicates.len(),
            "feature registry parsed"
        );
        Ok(registry)
    }

    /// Read and parse the feature document at `path`.
    pub fn load(path: &Path, matcher: &TableMatcher) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => FeatcovError::MissingDocument {
                path: path.to_path_buf(),
            },
            _ => FeatcovError::UnreadableDocument {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        })?;
        Self::parse(&text, matcher, path)
    }

    fn insert(&mut self, record: FeatureRecord) {
        if self.index.contains_key(&record.feature_id) {
            warn!(
                feature_id = %record.feature_id,
                "duplicate feature id in registry; keeping the first row"
            );
            self.duplicates.push(record.feature_id);
            return;
        }
        self.index
            .insert(record.feature_id.clone(), self.features.len());
        self.features.push(record);
    }

    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    pub fn get(&self, feature_id: &str) -> Option<&FeatureRecord> {
        self.index.get(feature_id).map(|&idx| &self.features[idx])
    }

    /// Feature ids that appeared more than once, in document order.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// SHA-256 over the canonical JSON of the records, hex encoded.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for record in &self.features {
            // Serializing a plain struct of strings and bools cannot fail.
            let line = serde_json::to_vec(record).unwrap_or_default();
            hasher.update(&line);
            hasher.update(b"\n");
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}
