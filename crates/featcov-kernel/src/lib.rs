//! # Featcov Kernel
//!
//! Feature-to-test traceability: every feature a project's feature table
//! declares as automated must be backed by an explicit coverage marker,
//! found either in an execution log or in the test sources.
//!
//! ## Architecture
//!
//! ```text
//! TableSchema / TableMatcher  ← header + row matching for the feature table
//!     │
//! Registry                    ← ordered FeatureRecords, first duplicate wins
//!     │
//! MarkerPattern               ← `E2E_CASE:<case id>` grammar
//!     │
//! EvidenceSet                 ← log or code scan, per EvidencePolicy
//!     │
//! CoverageReport / Verdict    ← reconcile + threshold gate
//!     │
//! report                      ← JSON or human rendering
//! ```

pub mod config;
pub mod error;
pub mod evidence;
pub mod marker;
pub mod pipeline;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod table;

pub use config::CheckConfig;
pub use error::FeatcovError;
pub use evidence::{EvidencePolicy, EvidenceSet, EvidenceSource, LogSpec};
pub use marker::MarkerPattern;
pub use reconcile::{CoverageReport, DEFAULT_THRESHOLD, Verdict, reconcile};
pub use registry::{FeatureRecord, Registry};
pub use report::OutputMode;
pub use table::{TableMatcher, TableSchema};
