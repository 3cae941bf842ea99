use super::load_system;
use crate::cli::MergeArgs;
use crate::config::PartialMergeConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use fepmerge::engine::progress::ProgressReporter;
use fepmerge::engine::search::McsSearch;
use fepmerge::workflows;
use tracing::info;

pub fn run(args: MergeArgs) -> Result<()> {
    let partial_config = PartialMergeConfig::load(args.mapping.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args.mapping, args.policy)?;

    let system0 = load_system(&args.mapping.system0)?;
    let system1 = load_system(&args.mapping.system1)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting ligand merge...");
    let result = workflows::merge::run(
        &system0,
        &system1,
        &config,
        &McsSearch::default(),
        &reporter,
    )?;
    let files = workflows::output::write_outputs(&result, &args.output, &reporter)?;

    println!(
        "✓ Merged '{}' ({} atoms, {} dummies at lambda=0, {} at lambda=1)",
        result.merged.name,
        result.merged.len(),
        result.merged.dummy_count_at_lambda0(),
        result.merged.dummy_count_at_lambda1(),
    );
    for path in files.all() {
        println!("  wrote {}", path.display());
    }
    Ok(())
}
