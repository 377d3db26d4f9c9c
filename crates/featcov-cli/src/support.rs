use crate::cli::SourceArgs;
use featcov_kernel::config::normalize_extensions;
use featcov_kernel::{CheckConfig, EvidencePolicy, FeatcovError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_PREFIX: &str = "[featcov]";

/// Optional TOML configuration file. Every key is optional; flags win.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub document: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub roots: Option<Vec<PathBuf>>,
    pub extensions: Option<Vec<String>>,
    pub threshold: Option<f64>,
    pub policy: Option<PolicyName>,
    pub marker: Option<String>,
    pub feature_prefix: Option<String>,
    pub case_prefix: Option<String>,
    pub header: Option<[String; 5]>,
    pub automated_tokens: Option<[String; 2]>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyName {
    PreferLog,
    FallbackOnEmptyLog,
    CodeOnly,
    Merge,
}

impl From<PolicyName> for EvidencePolicy {
    fn from(name: PolicyName) -> Self {
        match name {
            PolicyName::PreferLog => Self::PreferLog,
            PolicyName::FallbackOnEmptyLog => Self::FallbackOnEmptyLog,
            PolicyName::CodeOnly => Self::CodeOnly,
            PolicyName::Merge => Self::Merge,
        }
    }
}

/// Initialize stderr logging. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

/// Print a fatal error and exit with status 2.
pub fn fatal(err: &FeatcovError) -> ! {
    eprintln!("{LOG_PREFIX} ERROR ({}): {err}", err.kind());
    std::process::exit(2);
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, FeatcovError> {
    let text = fs::read_to_string(path).map_err(|err| {
        FeatcovError::InvalidConfig(format!("failed reading {}: {err}", path.display()))
    })?;
    let file: FileConfig = toml::from_str(&text).map_err(|err| {
        FeatcovError::InvalidConfig(format!("failed parsing {}: {err}", path.display()))
    })?;
    debug!(path = %path.display(), "config file loaded");
    Ok(file)
}

/// Layer flags over the config file over built-in defaults.
pub fn build_config(
    args: &SourceArgs,
    threshold: Option<f64>,
) -> Result<CheckConfig, FeatcovError> {
    let file = match &args.config {
        Some(path) => load_file_config(&resolve_against(&args.repo_root, path))?,
        None => FileConfig::default(),
    };

    let mut config = CheckConfig {
        repo_root: args.repo_root.clone(),
        ..CheckConfig::default()
    };

    if let Some(document) = args.doc.clone().or(file.document) {
        config.document = document;
    }
    if let Some(log) = args.log.clone().or(file.log) {
        config.log = log;
        config.log_explicit = true;
    }
    if !args.roots.is_empty() {
        config.roots = args.roots.clone();
    } else if let Some(roots) = file.roots {
        config.roots = roots;
    }
    if !args.extensions.is_empty() {
        config.extensions = normalize_extensions(&args.extensions);
    } else if let Some(extensions) = file.extensions {
        config.extensions = normalize_extensions(&extensions);
    }
    if let Some(threshold) = threshold.or(file.threshold) {
        config.threshold = threshold;
    }

    if let Some(policy) = policy_from_flags(args) {
        config.policy = policy;
    } else if let Some(policy) = file.policy {
        config.policy = policy.into();
    }

    if let Some(marker) = file.marker {
        config.marker = marker;
    }
    if let Some(prefix) = file.feature_prefix {
        config.schema.feature_prefix = prefix;
    }
    if let Some(prefix) = file.case_prefix {
        config.schema.case_prefix = prefix;
    }
    if let Some(header) = file.header {
        config.schema.header = header;
    }
    if let Some([yes, no]) = file.automated_tokens {
        config.schema.automated_yes = yes;
        config.schema.automated_no = no;
    }

    config.validate()?;
    debug!(
        repo_root = %config.repo_root.display(),
        document = %config.document.display(),
        policy = ?config.policy,
        threshold = config.threshold,
        "configuration resolved"
    );
    Ok(config)
}

pub fn build_config_or_exit(args: &SourceArgs, threshold: Option<f64>) -> CheckConfig {
    build_config(args, threshold).unwrap_or_else(|err| fatal(&err))
}

fn policy_from_flags(args: &SourceArgs) -> Option<EvidencePolicy> {
    if args.force_code_scan {
        Some(EvidencePolicy::CodeOnly)
    } else if args.merge_sources {
        Some(EvidencePolicy::Merge)
    } else if args.scan_code {
        Some(EvidencePolicy::FallbackOnEmptyLog)
    } else {
        None
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Render a JSON payload or exit with status 2.
pub fn render_json_or_exit(payload: &serde_json::Value, label: &str) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|err| {
        eprintln!("{LOG_PREFIX} ERROR: failed to render {label} payload: {err}");
        std::process::exit(2);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(root: &Path) -> SourceArgs {
        SourceArgs {
            repo_root: root.to_path_buf(),
            ..SourceArgs::default()
        }
    }

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let config = build_config(&args(Path::new(".")), None).expect("config should build");
        assert_eq!(config, CheckConfig::default());
    }

    #[test]
    fn file_values_fill_in_and_flags_win() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("featcov.toml"),
            r#"
document = "FEATURES.md"
roots = ["Sources", "Tests"]
extensions = [".kt"]
threshold = 0.75
policy = "code_only"
marker = "COVERS"
automated_tokens = ["是", "否"]
"#,
        )
        .expect("config file should be written");

        let mut source = args(dir.path());
        source.config = Some(PathBuf::from("featcov.toml"));
        source.roots = vec![PathBuf::from("UITests")];

        let config = build_config(&source, Some(0.5)).expect("config should build");
        assert_eq!(config.document, PathBuf::from("FEATURES.md"));
        assert_eq!(config.roots, [PathBuf::from("UITests")]);
        assert!(config.extensions.contains("kt"));
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.policy, EvidencePolicy::CodeOnly);
        assert_eq!(config.marker, "COVERS");
        assert_eq!(config.schema.automated_yes, "是");
        assert!(!config.log_explicit);
    }

    #[test]
    fn named_log_is_explicit() {
        let mut source = args(Path::new("."));
        source.log = Some(PathBuf::from("out/e2e.log"));
        let config = build_config(&source, None).expect("config should build");
        assert!(config.log_explicit);
        assert_eq!(config.log, PathBuf::from("out/e2e.log"));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("featcov.toml"), "thresold = 0.5\n")
            .expect("config file should be written");
        let mut source = args(dir.path());
        source.config = Some(PathBuf::from("featcov.toml"));
        match build_config(&source, None) {
            Err(FeatcovError::InvalidConfig(message)) => assert!(message.contains("featcov.toml")),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn scan_flags_map_to_policies() {
        let mut source = args(Path::new("."));
        source.scan_code = true;
        assert_eq!(
            build_config(&source, None).expect("config").policy,
            EvidencePolicy::FallbackOnEmptyLog
        );
        source.scan_code = false;
        source.force_code_scan = true;
        assert_eq!(
            build_config(&source, None).expect("config").policy,
            EvidencePolicy::CodeOnly
        );
    }
}
