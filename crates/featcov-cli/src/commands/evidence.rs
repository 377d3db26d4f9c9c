use crate::cli::SourceArgs;
use crate::support::{LOG_PREFIX, build_config_or_exit, fatal, render_json_or_exit};
use featcov_kernel::pipeline::collect_evidence;
use serde_json::json;

pub fn run(args: SourceArgs) {
    let config = build_config_or_exit(&args, None);
    let evidence = collect_evidence(&config).unwrap_or_else(|err| fatal(&err));

    if args.json {
        let payload = json!({
            "source": evidence.source().to_string(),
            "found_cases": evidence.cases(),
            "case_locations": evidence.locations(),
            "files_scanned": evidence.files_scanned(),
            "skipped_files": evidence.skipped_files(),
        });
        println!("{}", render_json_or_exit(&payload, "evidence"));
        return;
    }

    println!(
        "{LOG_PREFIX} evidence source={} cases={} files_scanned={} skipped_files={}",
        evidence.source(),
        evidence.cases().len(),
        evidence.files_scanned(),
        evidence.skipped_files()
    );
    for case in evidence.cases() {
        match evidence.locations().get(case) {
            Some(paths) => println!("  - {case}: {}", paths.join(", ")),
            None => println!("  - {case}"),
        }
    }
}
