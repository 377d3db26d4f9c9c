//! Coverage marker grammar: `<MARKER>:<case id>`, e.g. `E2E_CASE:E2E-01`.
//!
//! Only the full marker token counts as evidence. A bare case id in a file
//! name, a fixture or a comment contributes nothing.

use crate::error::{FeatcovError, Result};
use regex::Regex;
use std::collections::BTreeSet;

pub const DEFAULT_MARKER: &str = "E2E_CASE";

#[derive(Debug, Clone)]
pub struct MarkerPattern {
    re: Regex,
}

impl MarkerPattern {
    pub fn new(marker: &str, case_prefix: &str) -> Result<Self> {
        if marker.trim().is_empty() {
            return Err(FeatcovError::InvalidConfig(
                "marker literal must be non-empty".to_string(),
            ));
        }
        let pattern = format!(
            r"\b{}:({}\d+)\b",
            regex::escape(marker),
            regex::escape(case_prefix)
        );
        let re = Regex::new(&pattern).map_err(|err| {
            FeatcovError::InvalidConfig(format!("failed compiling marker pattern: {err}"))
        })?;
        Ok(Self { re })
    }

    /// Every distinct case id marked in `text`.
    pub fn find_cases(&self, text: &str) -> BTreeSet<String> {
        self.re
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
