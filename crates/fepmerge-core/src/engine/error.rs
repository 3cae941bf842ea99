use thiserror::Error;

use super::config::ConfigError;
use super::merge::MergeError;
use super::search::SearchError;
use crate::core::io::ReadError;
use crate::core::io::pdb::PdbError;
use crate::core::io::mapping::{MappingFileError, PrematchError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load structure: {0}")]
    Read(#[from] ReadError),

    #[error("Mapping file error: {0}")]
    MappingFile(#[from] MappingFileError),

    #[error("Prematch error: {0}")]
    Prematch(#[from] PrematchError),

    #[error("Substructure search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("No atom mapping found between '{molecule0}' and '{molecule1}'")]
    NoMapping { molecule0: String, molecule1: String },

    #[error("Molecule {index} not found in the {state} system ({len} molecules)")]
    MoleculeNotFound {
        state: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Failed to write PDB output: {0}")]
    PdbOutput(#[from] PdbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
