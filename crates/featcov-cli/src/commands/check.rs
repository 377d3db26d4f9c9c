use crate::cli::CheckArgs;
use crate::support::{LOG_PREFIX, build_config_or_exit, fatal};
use featcov_kernel::OutputMode;
use featcov_kernel::pipeline::run_check;
use featcov_kernel::report::render;

pub fn run(args: CheckArgs) {
    let config = build_config_or_exit(&args.source, args.threshold);
    let report = run_check(&config).unwrap_or_else(|err| fatal(&err));

    let mode = if args.source.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    match render(&report, mode) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => eprintln!("{LOG_PREFIX} ERROR: failed to render coverage report: {err}"),
    }

    std::process::exit(report.verdict().exit_code());
}
