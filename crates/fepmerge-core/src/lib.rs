//! # fepmerge Core Library
//!
//! Prepares the end states of an alchemical free-energy perturbation: it
//! finds (or reads) a correspondence between the atoms of two ligands, aligns
//! one onto the other and merges them into a single dual-topology molecule
//! whose unmatched atoms become dummies at one end state.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`MolecularSystem`,
//!   `AtomMapping`, `MergedMolecule`), ring perception, Kabsch superposition
//!   and all file formats.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the maximum common
//!   substructure search behind the [`engine::search::SubstructureSearch`]
//!   seam, mapping resolution, alignment and the merge itself.
//!
//! - **[`workflows`]: The Public API.** Complete procedures that tie the
//!   other layers together: resolve a mapping, merge two systems and write
//!   every output file under a common stem.

pub mod core;
pub mod engine;
pub mod workflows;
