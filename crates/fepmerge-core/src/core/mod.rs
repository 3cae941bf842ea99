//! # Core Module
//!
//! The stateless foundation of the library: molecular data models, file
//! formats and the graph and geometry routines the merge engine builds on.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, molecules, systems, atom mappings and merged dual-topology molecules
//! - **File I/O** ([`io`]) - BGF, MOL2 and PDB structures; AMBER, SOMD and mapping outputs
//! - **Connectivity Analysis** ([`topology`]) - Ring perception on bond graphs
//! - **Geometry** ([`utils`]) - Centroids, RMSD and optimal rigid-body superposition
//!
//! Nothing in this module holds state between calls or performs logging; the
//! [`engine`](crate::engine) layer drives it.

pub mod io;
pub mod models;
pub mod topology;
pub mod utils;
