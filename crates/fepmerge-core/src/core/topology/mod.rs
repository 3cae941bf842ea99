//! # Topology Module
//!
//! Graph-level analysis of molecular connectivity.
//!
//! ## Key Components
//!
//! - [`rings`] - Ring perception: ring bonds and the smallest ring through an atom or bond
//!
//! ## Usage
//!
//! Ring information is used by the merge step to decide whether a mapping
//! opens, closes or resizes a ring.
//!
//! ```ignore
//! use fepmerge::core::topology::rings::RingInfo;
//!
//! let rings = RingInfo::perceive(&ligand);
//! assert_eq!(rings.smallest_ring_size(0), Some(6));
//! ```

pub mod rings;
