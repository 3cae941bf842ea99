//! # Engine Module
//!
//! The computational core of the merge pipeline: finding an atom mapping
//! between two ligands, aligning one onto the other and building the merged
//! dual-topology molecule.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Search limits, mapping inputs and the ring merge policy
//! - **Substructure Search** ([`search`]) - The [`search::SubstructureSearch`] trait and the built-in MCS search
//! - **Mapping Resolution** ([`resolver`]) - Chooses between a user mapping file and the best search candidate
//! - **Merging** ([`merge`]) - Kabsch alignment, ring policy checks and dual-topology construction
//! - **Progress Monitoring** ([`progress`]) - Progress events for front ends
//! - **Error Handling** ([`error`]) - The [`error::EngineError`] umbrella type
//!
//! ## Key Capabilities
//!
//! - **Deadline-bounded search** returning candidates ranked by RMSD
//! - **Prematch constraints** that seed and restrict the search
//! - **Pluggable search** through a trait object, so callers can supply their own matcher

pub mod config;
pub mod error;
pub mod merge;
pub mod progress;
pub mod resolver;
pub mod search;
