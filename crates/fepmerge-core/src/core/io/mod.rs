//! Provides input/output functionality for molecular file formats.
//!
//! Structure readers and writers implement [`traits::MolecularFile`]; the
//! perturbation outputs (`prm7`, `rst7`, `pert`) are write-only functions, and
//! [`mapping`] handles the text formats used to exchange atom mappings.
//! [`read_system`] picks a reader from the file extension.

pub mod amber;
pub mod bgf;
pub mod mapping;
pub mod mol2;
pub mod pdb;
pub mod pert;
pub mod traits;

use crate::core::models::system::MolecularSystem;
use bgf::{BgfError, BgfFile};
use mol2::{Mol2Error, Mol2File};
use pdb::{PdbError, PdbFile};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use traits::MolecularFile;

/// A file format known to the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Bgf,
    Mol2,
    Pdb,
    Prm7,
    Rst7,
    Pert,
    Mapping,
    Csv,
}

impl FileFormat {
    pub const ALL: [FileFormat; 8] = [
        FileFormat::Bgf,
        FileFormat::Mol2,
        FileFormat::Pdb,
        FileFormat::Prm7,
        FileFormat::Rst7,
        FileFormat::Pert,
        FileFormat::Mapping,
        FileFormat::Csv,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Bgf => "bgf",
            FileFormat::Mol2 => "mol2",
            FileFormat::Pdb => "pdb",
            FileFormat::Prm7 => "prm7",
            FileFormat::Rst7 => "rst7",
            FileFormat::Pert => "pert",
            FileFormat::Mapping => "mapping",
            FileFormat::Csv => "csv",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FileFormat::Bgf => "BIOGRF structure with force-field types and charges",
            FileFormat::Mol2 => "Tripos MOL2 structure",
            FileFormat::Pdb => "Protein Data Bank coordinates with CONECT records",
            FileFormat::Prm7 => "AMBER topology (atoms, residues, bonds)",
            FileFormat::Rst7 => "AMBER ASCII coordinates",
            FileFormat::Pert => "SOMD perturbation file",
            FileFormat::Mapping => "Human-readable atom mapping log",
            FileFormat::Csv => "Atom mapping as 'idxA,idxB' lines",
        }
    }

    /// Whether a molecular system can be loaded from this format.
    pub fn is_structure_input(self) -> bool {
        matches!(self, FileFormat::Bgf | FileFormat::Mol2 | FileFormat::Pdb)
    }

    /// Guesses the format from a path's extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<FileFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        FileFormat::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Cannot determine a structure format for '{0}'")]
    UnsupportedFormat(PathBuf),
    #[error("BGF: {0}")]
    Bgf(#[from] BgfError),
    #[error("MOL2: {0}")]
    Mol2(#[from] Mol2Error),
    #[error("PDB: {0}")]
    Pdb(#[from] PdbError),
}

/// Loads a molecular system, choosing the reader from the file extension.
pub fn read_system(path: &Path) -> Result<MolecularSystem, ReadError> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Bgf) => Ok(BgfFile::read_from_path(path)?),
        Some(FileFormat::Mol2) => Ok(Mol2File::read_from_path(path)?),
        Some(FileFormat::Pdb) => Ok(PdbFile::read_from_path(path)?),
        _ => Err(ReadError::UnsupportedFormat(path.to_path_buf())),
    }
}
