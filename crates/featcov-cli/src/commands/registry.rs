use crate::cli::SourceArgs;
use crate::support::{LOG_PREFIX, build_config_or_exit, fatal, render_json_or_exit};
use featcov_kernel::pipeline::load_registry;
use serde_json::json;

pub fn run(args: SourceArgs) {
    let config = build_config_or_exit(&args, None);
    let registry = load_registry(&config).unwrap_or_else(|err| fatal(&err));
    let automated = registry.features().iter().filter(|f| f.automated).count();
    let digest = registry.digest();

    if args.json {
        let features: Vec<_> = registry
            .features()
            .iter()
            .map(|f| {
                json!({
                    "id": f.feature_id,
                    "name": f.name,
                    "e2e": f.e2e_case_id,
                    "automated": f.automated,
                })
            })
            .collect();
        let payload = json!({
            "document": config.resolve(&config.document).display().to_string(),
            "total": registry.len(),
            "automated": automated,
            "features": features,
            "duplicates": registry.duplicates(),
            "registry_digest": digest,
        });
        println!("{}", render_json_or_exit(&payload, "registry"));
        return;
    }

    println!(
        "{LOG_PREFIX} registry OK (features={}, automated={}, duplicates={}, digest={})",
        registry.len(),
        automated,
        registry.duplicates().len(),
        digest
    );
    for f in registry.features() {
        let flag = if f.automated { "automated" } else { "manual" };
        println!("  - {} {} ({}, {flag})", f.feature_id, f.name, f.e2e_case_id);
    }
    for id in registry.duplicates() {
        println!("  ! duplicate row for {id} ignored");
    }
}
