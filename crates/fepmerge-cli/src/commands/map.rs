use super::load_system;
use crate::cli::{MapArgs, PolicyFlags};
use crate::config::PartialMergeConfig;
use crate::error::{CliError, Result};
use anyhow::Context;
use fepmerge::core::io::mapping::{write_csv_mapping, write_mapping_log};
use fepmerge::engine::error::EngineError;
use fepmerge::engine::progress::ProgressReporter;
use fepmerge::engine::search::McsSearch;
use fepmerge::workflows::merge::resolve_mapping;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::info;

pub fn run(args: MapArgs) -> Result<()> {
    let config = PartialMergeConfig::load(args.mapping.config.as_deref())?
        .merge_with_cli(&args.mapping, PolicyFlags::default())?;

    let system0 = load_system(&args.mapping.system0)?;
    let system1 = load_system(&args.mapping.system1)?;

    let (a, b, resolved) = resolve_mapping(
        &system0,
        &system1,
        config.molecule0,
        config.molecule1,
        &config.mapping,
        &McsSearch::default(),
        &ProgressReporter::new(),
    )?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_mapping_log(&a, &b, &resolved.mapping, &mut out).map_err(EngineError::from)?;
    if let Some(score) = resolved.score {
        writeln!(out, "# RMSD {:.4} Å", score)?;
    }

    if let Some(path) = &args.output {
        let output_error = |source: anyhow::Error| CliError::Output {
            path: path.clone(),
            source,
        };
        let file = File::create(path)
            .context("cannot create mapping CSV")
            .map_err(output_error)?;
        let mut writer = BufWriter::new(file);
        write_csv_mapping(&resolved.mapping, &mut writer)
            .context("cannot write mapping CSV")
            .and_then(|()| writer.flush().context("cannot flush mapping CSV"))
            .map_err(output_error)?;
        info!(path = %path.display(), "Mapping written as CSV.");
    }
    Ok(())
}
