//! Pipe-table matching: the header matcher and the row matcher.
//!
//! The document format is validated here, independently of how coverage
//! evidence is recognised. A [`TableSchema`] is plain data (it comes from
//! defaults or a config file); [`TableSchema::compile`] turns it into a
//! [`TableMatcher`] that owns the compiled row pattern.

use crate::error::{FeatcovError, Result};
use regex::Regex;

/// Number of columns in the feature table.
pub const COLUMN_COUNT: usize = 5;

pub const DEFAULT_HEADER: [&str; COLUMN_COUNT] = [
    "功能ID",
    "功能名称",
    "当前行为（摘要）",
    "E2E 用例",
    "自动化",
];
pub const DEFAULT_FEATURE_PREFIX: &str = "F-";
pub const DEFAULT_CASE_PREFIX: &str = "E2E-";
pub const DEFAULT_AUTOMATED_YES: &str = "Yes";
pub const DEFAULT_AUTOMATED_NO: &str = "No";

/// Shape of the feature table: header labels and row vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Column labels in order: feature id, name, summary, E2E case, automated.
    pub header: [String; COLUMN_COUNT],
    pub feature_prefix: String,
    pub case_prefix: String,
    pub automated_yes: String,
    pub automated_no: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.map(str::to_string),
            feature_prefix: DEFAULT_FEATURE_PREFIX.to_string(),
            case_prefix: DEFAULT_CASE_PREFIX.to_string(),
            automated_yes: DEFAULT_AUTOMATED_YES.to_string(),
            automated_no: DEFAULT_AUTOMATED_NO.to_string(),
        }
    }
}

/// One table row that matched the row pattern, before registry assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub feature_id: String,
    pub name: String,
    pub summary: String,
    pub e2e_case_id: String,
    pub automated: bool,
}

/// Compiled form of a [`TableSchema`].
#[derive(Debug, Clone)]
pub struct TableMatcher {
    header: [String; COLUMN_COUNT],
    row_re: Regex,
    automated_yes: String,
}

impl TableSchema {
    pub fn compile(&self) -> Result<TableMatcher> {
        for (idx, label) in self.header.iter().enumerate() {
            if normalize_cell(label).is_empty() {
                return Err(FeatcovError::InvalidConfig(format!(
                    "header label {idx} must be non-empty"
                )));
            }
        }
        for (label, value) in [
            ("feature prefix", &self.feature_prefix),
            ("case prefix", &self.case_prefix),
            ("automated yes token", &self.automated_yes),
            ("automated no token", &self.automated_no),
        ] {
            if value.trim().is_empty() || value.contains('|') {
                return Err(FeatcovError::InvalidConfig(format!(
                    "{label} must be non-empty and must not contain '|': {value:?}"
                )));
            }
        }
        if self.automated_yes == self.automated_no {
            return Err(FeatcovError::InvalidConfig(format!(
                "automated tokens must differ: both are {:?}",
                self.automated_yes
            )));
        }

        let pattern = format!(
            r"^\|\s*({fp}\d+)\s*\|\s*([^|]+?)\s*\|\s*([^|]*?)\s*\|\s*({cp}\d+)\s*\|\s*({yes}|{no})\s*\|\s*$",
            fp = regex::escape(&self.feature_prefix),
            cp = regex::escape(&self.case_prefix),
            yes = regex::escape(&self.automated_yes),
            no = regex::escape(&self.automated_no),
        );
        let row_re = Regex::new(&pattern).map_err(|err| {
            FeatcovError::InvalidConfig(format!("failed compiling table row pattern: {err}"))
        })?;

        Ok(TableMatcher {
            header: self.header.clone().map(|label| normalize_cell(&label)),
            row_re,
            automated_yes: self.automated_yes.clone(),
        })
    }
}

impl TableMatcher {
    /// Whether `line` is the feature table header.
    ///
    /// Cells are compared after trimming and collapsing inner whitespace;
    /// labels must otherwise match exactly.
    pub fn header_matches(&self, line: &str) -> bool {
        let Some(cells) = split_cells(line) else {
            return false;
        };
        cells.len() == COLUMN_COUNT
            && cells
                .iter()
                .zip(self.header.iter())
                .all(|(cell, label)| normalize_cell(cell) == *label)
    }

    /// Match one table line against the five-column row pattern.
    ///
    /// Returns `None` for decoration rows, separator rows, rows with an
    /// unknown automated token and rows with an empty name. The leading
    /// pipe must be the first character: indented rows do not match.
    pub fn parse_row(&self, line: &str) -> Option<RawRow> {
        let caps = self.row_re.captures(line.trim_end())?;
        let name = caps.get(2)?.as_str().trim();
        if name.is_empty() {
            return None;
        }
        Some(RawRow {
            feature_id: caps.get(1)?.as_str().to_string(),
            name: name.to_string(),
            summary: caps.get(3)?.as_str().trim().to_string(),
            e2e_case_id: caps.get(4)?.as_str().to_string(),
            automated: caps.get(5)?.as_str() == self.automated_yes,
        })
    }
}

/// Whether `line` belongs to a pipe table at all.
pub fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn split_cells(line: &str) -> Option<Vec<&str>> {
    let inner = line.trim().strip_prefix('|')?.strip_suffix('|')?;
    Some(inner.split('|').collect())
}

fn normalize_cell(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}
