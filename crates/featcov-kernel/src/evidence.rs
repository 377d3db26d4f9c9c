//! Evidence collection: which E2E cases have demonstrated coverage.
//!
//! Evidence comes from an execution log or from a static scan of test
//! sources. [`EvidencePolicy`] decides which; the choice is recorded in
//! [`EvidenceSource`] so the report says where the verdict came from.
//!
//! The case set depends only on file contents, never on visitation order.
//! Per-case location lists are sorted and deduplicated before they leave
//! this module.

use crate::error::{FeatcovError, Result};
use crate::marker::MarkerPattern;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Precedence between the execution log and the code scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvidencePolicy {
    /// Use the log when it exists, otherwise scan code.
    #[default]
    PreferLog,
    /// Like `PreferLog`, but scan code when the log holds no markers.
    FallbackOnEmptyLog,
    /// Always scan code; the log is ignored.
    CodeOnly,
    /// Union of log markers and code markers.
    Merge,
}

/// Execution log location and whether the caller asked for it by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSpec {
    pub path: PathBuf,
    pub explicit: bool,
}

/// Where the evidence set came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceSource {
    Log { path: String },
    Code,
    /// Code scan because an explicitly requested log does not exist.
    CodeMissingLog { path: String },
    Merged { path: String },
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log { path } => write!(f, "log:{path}"),
            Self::Code => f.write_str("code"),
            Self::CodeMissingLog { path } => write!(f, "code;missing-log:{path}"),
            Self::Merged { path } => write!(f, "log:{path}+code"),
        }
    }
}

/// Inputs for one evidence collection.
#[derive(Debug, Clone)]
pub struct EvidenceRequest<'a> {
    /// Base for the relative paths reported in sources and locations.
    pub repo_root: &'a Path,
    pub log: &'a LogSpec,
    pub roots: &'a [PathBuf],
    /// File extensions without the leading dot; exact, case-sensitive.
    pub extensions: &'a BTreeSet<String>,
    pub policy: EvidencePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceSet {
    cases: BTreeSet<String>,
    locations: BTreeMap<String, Vec<String>>,
    source: EvidenceSource,
    files_scanned: usize,
    skipped_files: usize,
}

impl EvidenceSet {
    /// Evidence known up front, with no scan diagnostics.
    pub fn from_cases<I, S>(cases: I, source: EvidenceSource) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cases: cases.into_iter().map(Into::into).collect(),
            locations: BTreeMap::new(),
            source,
            files_scanned: 0,
            skipped_files: 0,
        }
    }

    pub fn contains(&self, case_id: &str) -> bool {
        self.cases.contains(case_id)
    }

    pub fn cases(&self) -> &BTreeSet<String> {
        &self.cases
    }

    /// Case id to sorted relative file paths. Empty unless code was scanned.
    pub fn locations(&self) -> &BTreeMap<String, Vec<String>> {
        &self.locations
    }

    pub fn source(&self) -> &EvidenceSource {
        &self.source
    }

    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    pub fn skipped_files(&self) -> usize {
        self.skipped_files
    }
}

/// Collect evidence according to `request.policy`.
pub fn collect(request: &EvidenceRequest<'_>, marker: &MarkerPattern) -> Result<EvidenceSet> {
    let log_label = relative_display(request.repo_root, &request.log.path);

    if request.policy == EvidencePolicy::CodeOnly {
        debug!("code scan forced; execution log ignored");
        return Ok(scan_code(request, marker).into_set(EvidenceSource::Code));
    }

    if !request.log.path.exists() {
        if request.log.explicit {
            warn!(log = %log_label, "requested execution log not found; scanning code instead");
            return Ok(scan_code(request, marker).into_set(EvidenceSource::CodeMissingLog {
                path: log_label,
            }));
        }
        debug!(log = %log_label, "no execution log; scanning code");
        return Ok(scan_code(request, marker).into_set(EvidenceSource::Code));
    }

    let log_cases = read_log(&request.log.path, marker)?;
    debug!(log = %log_label, cases = log_cases.len(), "execution log scanned");

    match request.policy {
        EvidencePolicy::FallbackOnEmptyLog if log_cases.is_empty() => {
            info!(log = %log_label, "execution log has no markers; scanning code instead");
            Ok(scan_code(request, marker).into_set(EvidenceSource::Code))
        }
        EvidencePolicy::Merge => {
            let mut scan = scan_code(request, marker);
            scan.cases.extend(log_cases);
            Ok(scan.into_set(EvidenceSource::Merged { path: log_label }))
        }
        _ => Ok(EvidenceSet::from_cases(
            log_cases,
            EvidenceSource::Log { path: log_label },
        )),
    }
}

/// Marked cases in an execution log.
pub fn read_log(path: &Path, marker: &MarkerPattern) -> Result<BTreeSet<String>> {
    let bytes = fs::read(path).map_err(|err| FeatcovError::UnreadableLog {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    Ok(marker.find_cases(&String::from_utf8_lossy(&bytes)))
}

#[derive(Debug, Default)]
struct CodeScan {
    cases: BTreeSet<String>,
    locations: BTreeMap<String, Vec<String>>,
    files_scanned: usize,
    skipped_files: usize,
}

impl CodeScan {
    fn into_set(mut self, source: EvidenceSource) -> EvidenceSet {
        for paths in self.locations.values_mut() {
            paths.sort();
            paths.dedup();
        }
        EvidenceSet {
            cases: self.cases,
            locations: self.locations,
            source,
            files_scanned: self.files_scanned,
            skipped_files: self.skipped_files,
        }
    }
}

fn scan_code(request: &EvidenceRequest<'_>, marker: &MarkerPattern) -> CodeScan {
    let mut files = Vec::new();
    for root in request.roots {
        if root.is_file() {
            if has_extension(root, request.extensions) {
                files.push(root.clone());
            }
            continue;
        }
        if !root.is_dir() {
            debug!(root = %root.display(), "scan root missing; skipped");
            continue;
        }
        walk(root, request.extensions, &mut files);
    }

    let mut scan = CodeScan::default();
    for path in files {
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(file = %path.display(), error = %err, "unreadable file skipped");
                scan.skipped_files += 1;
                continue;
            }
        };
        scan.files_scanned += 1;
        let found = marker.find_cases(&String::from_utf8_lossy(&bytes));
        if found.is_empty() {
            continue;
        }
        let rel = relative_display(request.repo_root, &path);
        for case in found {
            scan.locations
                .entry(case.clone())
                .or_default()
                .push(rel.clone());
            scan.cases.insert(case);
        }
    }

    debug!(
        files_scanned = scan.files_scanned,
        skipped_files = scan.skipped_files,
        cases = scan.cases.len(),
        "code scan finished"
    );
    scan
}

/// Recursive, name-sorted walk. Symlinked files are read; symlinked
/// directories are not descended into.
fn walk(dir: &Path, extensions: &BTreeSet<String>, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), error = %err, "unreadable directory skipped");
            return;
        }
    };
    let mut entries: Vec<_> = entries.filter_map(|entry| entry.ok()).collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            walk(&path, extensions, out);
        } else if file_type.is_file() && has_extension(&path, extensions) {
            out.push(path);
        } else if file_type.is_symlink()
            && has_extension(&path, extensions)
            && fs::metadata(&path).is_ok_and(|meta| meta.is_file())
        {
            out.push(path);
        }
    }
}

fn has_extension(path: &Path, extensions: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(ext))
}

/// `path` relative to `base` with `/` separators, or the full path when it
/// lies outside `base`.
pub fn relative_display(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    let parts: Vec<String> = rel
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return path.display().to_string();
    }
    if rel.is_absolute() {
        return rel.display().to_string();
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::DEFAULT_MARKER;
    use tempfile::TempDir;

    fn marker() -> MarkerPattern {
        MarkerPattern::new(DEFAULT_MARKER, "E2E-").expect("marker should compile")
    }

    fn extensions() -> BTreeSet<String> {
        ["swift", "m", "mm"].into_iter().map(String::from).collect()
    }

    fn write(dir: &Path, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir should be created");
        }
        fs::write(&path, contents).expect("fixture should be written");
        path
    }

    struct Fixture {
        dir: TempDir,
        log: LogSpec,
        roots: Vec<PathBuf>,
        extensions: BTreeSet<String>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("temp dir");
            let log = LogSpec {
                path: dir.path().join(".e2e.log"),
                explicit: false,
            };
            let roots = vec![dir.path().join("App")];
            Self {
                dir,
                log,
                roots,
                extensions: extensions(),
            }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn collect(&self, policy: EvidencePolicy) -> EvidenceSet {
            let request = EvidenceRequest {
                repo_root: self.dir.path(),
                log: &self.log,
                roots: &self.roots,
                extensions: &self.extensions,
                policy,
            };
            collect(&request, &marker()).expect("evidence should be collected")
        }
    }

    #[test]
    fn absent_default_log_scans_code() {
        let fx = Fixture::new();
        write(fx.root(), "App/UITests/FlowTests.swift", "// E2E_CASE:E2E-01\n");

        let evidence = fx.collect(EvidencePolicy::PreferLog);
        assert_eq!(evidence.source(), &EvidenceSource::Code);
        assert_eq!(evidence.source().to_string(), "code");
        assert!(evidence.contains("E2E-01"));
        assert_eq!(
            evidence.locations().get("E2E-01"),
            Some(&vec!["App/UITests/FlowTests.swift".to_string()])
        );
    }

    #[test]
    fn existing_log_without_markers_yields_empty_set() {
        let fx = Fixture::new();
        write(fx.root(), ".e2e.log", "Test Suite passed\n");
        write(fx.root(), "App/FlowTests.swift", "// E2E_CASE:E2E-01\n");

        let evidence = fx.collect(EvidencePolicy::PreferLog);
        assert!(evidence.cases().is_empty());
        assert_eq!(evidence.source().to_string(), "log:.e2e.log");
        assert!(evidence.locations().is_empty());
    }

    #[test]
    fn log_markers_are_used_when_present() {
        let fx = Fixture::new();
        write(
            fx.root(),
            ".e2e.log",
            "[e2e] E2E_CASE:E2E-02 ok\n[e2e] E2E_CASE:E2E-03 ok\n",
        );
        write(fx.root(), "App/FlowTests.swift", "// E2E_CASE:E2E-01\n");

        let evidence = fx.collect(EvidencePolicy::FallbackOnEmptyLog);
        let cases: Vec<&str> = evidence.cases().iter().map(String::as_str).collect();
        assert_eq!(cases, ["E2E-02", "E2E-03"]);
        assert_eq!(evidence.files_scanned(), 0);
    }

    #[test]
    fn fallback_scans_code_when_log_is_empty() {
        let fx = Fixture::new();
        write(fx.root(), ".e2e.log", "");
        write(fx.root(), "App/FlowTests.swift", "// E2E_CASE:E2E-01\n");

        let evidence = fx.collect(EvidencePolicy::FallbackOnEmptyLog);
        assert_eq!(evidence.source(), &EvidenceSource::Code);
        assert!(evidence.contains("E2E-01"));
    }

    #[test]
    fn code_only_ignores_log() {
        let fx = Fixture::new();
        write(fx.root(), ".e2e.log", "E2E_CASE:E2E-09\n");
        write(fx.root(), "App/FlowTests.swift", "// E2E_CASE:E2E-01\n");

        let evidence = fx.collect(EvidencePolicy::CodeOnly);
        assert_eq!(evidence.source(), &EvidenceSource::Code);
        assert!(evidence.contains("E2E-01"));
        assert!(!evidence.contains("E2E-09"));
    }

    #[test]
    fn merge_unions_both_sources() {
        let fx = Fixture::new();
        write(fx.root(), ".e2e.log", "E2E_CASE:E2E-09\n");
        write(fx.root(), "App/FlowTests.swift", "// E2E_CASE:E2E-01\n");

        let evidence = fx.collect(EvidencePolicy::Merge);
        assert_eq!(evidence.source().to_string(), "log:.e2e.log+code");
        assert!(evidence.contains("E2E-01"));
        assert!(evidence.contains("E2E-09"));
        assert!(!evidence.locations().contains_key("E2E-09"));
    }

    #[test]
    fn explicit_missing_log_is_reported_distinctly() {
        let mut fx = Fixture::new();
        fx.log = LogSpec {
            path: fx.root().join("logs/run.log"),
            explicit: true,
        };
        write(fx.root(), "App/FlowTests.swift", "// E2E_CASE:E2E-01\n");

        let evidence = fx.collect(EvidencePolicy::PreferLog);
        assert_eq!(
            evidence.source().to_string(),
            "code;missing-log:logs/run.log"
        );
        assert!(evidence.contains("E2E-01"));
    }

    #[test]
    fn only_configured_extensions_are_scanned() {
        let fx = Fixture::new();
        write(fx.root(), "App/notes.md", "E2E_CASE:E2E-01\n");
        write(fx.root(), "App/Flow.SWIFT", "E2E_CASE:E2E-02\n");
        write(fx.root(), "App/Bridge.mm", "E2E_CASE:E2E-03\n");

        let evidence = fx.collect(EvidencePolicy::CodeOnly);
        let cases: Vec<&str> = evidence.cases().iter().map(String::as_str).collect();
        assert_eq!(cases, ["E2E-03"]);
        assert_eq!(evidence.files_scanned(), 1);
    }

    #[test]
    fn bare_identifiers_in_names_and_comments_do_not_count() {
        let fx = Fixture::new();
        write(fx.root(), "App/Fixtures/E2E-04.swift", "// asset for E2E-04\n");

        let evidence = fx.collect(EvidencePolicy::CodeOnly);
        assert!(evidence.cases().is_empty());
    }

    #[test]
    fn locations_are_sorted_and_deduplicated() {
        let mut fx = Fixture::new();
        write(fx.root(), "App/b/Second.swift", "E2E_CASE:E2E-01 E2E_CASE:E2E-01\n");
        write(fx.root(), "App/a/First.m", "E2E_CASE:E2E-01\n");
        // overlapping roots must not duplicate locations
        let nested = fx.root().join("App/b");
        fx.roots.push(nested);

        let evidence = fx.collect(EvidencePolicy::CodeOnly);
        assert_eq!(
            evidence.locations().get("E2E-01"),
            Some(&vec![
                "App/a/First.m".to_string(),
                "App/b/Second.swift".to_string()
            ])
        );
    }

    #[test]
    fn root_order_does_not_change_case_set() {
        let mut fx = Fixture::new();
        write(fx.root(), "Alpha/One.swift", "E2E_CASE:E2E-01\n");
        write(fx.root(), "Beta/Two.swift", "E2E_CASE:E2E-02\nE2E_CASE:E2E-01\n");

        fx.roots = vec![fx.root().join("Alpha"), fx.root().join("Beta")];
        let forward = fx.collect(EvidencePolicy::CodeOnly);
        fx.roots.reverse();
        let backward = fx.collect(EvidencePolicy::CodeOnly);

        assert_eq!(forward.cases(), backward.cases());
        assert_eq!(forward.locations(), backward.locations());
    }

    #[test]
    fn missing_roots_and_non_utf8_files_do_not_abort() {
        let mut fx = Fixture::new();
        let absent = fx.root().join("Nowhere");
        fx.roots.push(absent);
        let mut bytes = vec![0xff, 0xfe, b'\n'];
        bytes.extend_from_slice(b"// E2E_CASE:E2E-05\n");
        write(fx.root(), "App/Binary.swift", bytes);

        let evidence = fx.collect(EvidencePolicy::CodeOnly);
        assert!(evidence.contains("E2E-05"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_scanned_but_symlinked_dirs_are_not() {
        use std::os::unix::fs::symlink;

        let fx = Fixture::new();
        let shared = write(fx.root(), "Shared/Flow.swift", "// E2E_CASE:E2E-01\n");
        write(fx.root(), "Elsewhere/Deep.swift", "// E2E_CASE:E2E-02\n");
        fs::create_dir_all(fx.root().join("App")).expect("root dir should be created");
        symlink(&shared, fx.root().join("App/Flow.swift")).expect("file link should be created");
        symlink(fx.root().join("Elsewhere"), fx.root().join("App/Linked"))
            .expect("dir link should be created");

        let evidence = fx.collect(EvidencePolicy::CodeOnly);
        let cases: Vec<&str> = evidence.cases().iter().map(String::as_str).collect();
        assert_eq!(cases, ["E2E-01"]);
        assert_eq!(evidence.files_scanned(), 1);
        assert_eq!(
            evidence.locations().get("E2E-01"),
            Some(&vec!["App/Flow.swift".to_string()])
        );
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_skipped_and_counted() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        write(fx.root(), "App/Readable.swift", "// E2E_CASE:E2E-01\n");
        let locked = write(fx.root(), "App/Locked.swift", "// E2E_CASE:E2E-02\n");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))
            .expect("permissions should be set");
        if fs::read(&locked).is_ok() {
            // privileged user: permission bits are not enforced
            return;
        }

        let evidence = fx.collect(EvidencePolicy::CodeOnly);
        assert!(evidence.contains("E2E-01"));
        assert!(!evidence.contains("E2E-02"));
        assert_eq!(evidence.files_scanned(), 1);
        assert_eq!(evidence.skipped_files(), 1);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))
            .expect("permissions should be restored");
    }

    #[test]
    fn relative_display_uses_forward_slashes() {
        let base = Path::new("/repo");
        assert_eq!(
            relative_display(base, Path::new("/repo/App/Tests/A.swift")),
            "App/Tests/A.swift"
        );
        assert_eq!(
            relative_display(Path::new("."), Path::new("./App/A.swift")),
            "App/A.swift"
        );
        assert_eq!(
            relative_display(base, Path::new("/elsewhere/A.swift")),
            "/elsewhere/A.swift"
        );
    }
}
