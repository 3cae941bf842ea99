pub mod formats;
pub mod map;
pub mod merge;

use crate::error::{CliError, Result};
use fepmerge::core::io::read_system;
use fepmerge::core::models::system::MolecularSystem;
use std::path::Path;
use tracing::info;

fn load_system(path: &Path) -> Result<MolecularSystem> {
    info!("Loading input structure from {:?}", path);
    let system = read_system(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    info!(
        molecules = system.len(),
        atoms = system.atom_count(),
        "Structure loaded."
    );
    Ok(system)
}
