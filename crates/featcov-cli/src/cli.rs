use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "featcov",
    about = "Featcov: check that automated features in a feature table are backed by E2E evidence",
    version,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Flags for the default `check` run
    #[command(flatten)]
    pub check: CheckArgs,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        match &self.command {
            None => self.check.source.verbose,
            Some(Commands::Check(args)) => args.source.verbose,
            Some(Commands::Registry(args)) | Some(Commands::Evidence(args)) => args.verbose,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the coverage gate (the default when no subcommand is given)
    Check(CheckArgs),

    /// Parse the feature document and print the registry
    Registry(SourceArgs),

    /// Collect coverage evidence and print where it was found
    Evidence(SourceArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Minimum coverage ratio for a passing run [default: 0.90]
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Base directory for relative paths
    #[arg(long, default_value = ".")]
    pub repo_root: PathBuf,

    /// TOML file with configuration defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Feature document (Markdown with the feature table)
    #[arg(long)]
    pub doc: Option<PathBuf>,

    /// Execution log to take coverage markers from
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Test source root to scan (repeatable)
    #[arg(long = "root")]
    pub roots: Vec<PathBuf>,

    /// File extension to scan, without the dot (repeatable)
    #[arg(long = "ext")]
    pub extensions: Vec<String>,

    /// Scan test sources when the execution log holds no markers
    #[arg(long)]
    pub scan_code: bool,

    /// Always scan test sources and ignore the execution log
    #[arg(long, conflicts_with_all = ["scan_code", "merge_sources"])]
    pub force_code_scan: bool,

    /// Union of log markers and test source markers
    #[arg(long, conflicts_with = "scan_code")]
    pub merge_sources: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Log debug diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|err| format!("invalid threshold `{raw}`: {err}"))?;
    if !value.is_finite() {
        return Err(format!("threshold must be a finite number, got `{raw}`"));
    }
    Ok(value)
}
