//! # Workflows Module
//!
//! High-level entry points that chain the engine steps into complete runs.
//!
//! - **Merge Workflow** ([`merge`]) - Resolves the mapping, aligns, merges and
//!   substitutes the merged molecule into the lambda=0 system.
//! - **Output** ([`output`]) - Writes a finished merge to disk as
//!   `<output>.{prm7,rst7,pdb,pert,mapping}`.

pub mod merge;
pub mod output;
