//! # Core Models Module
//!
//! Data structures used to represent molecular systems in fepmerge.
//!
//! ## Key Components
//!
//! - [`element`] - Chemical elements, symbols and masses
//! - [`atom`] - Individual atom representation with coordinates, type and charge
//! - [`topology`] - Bonds and bond orders
//! - [`molecule`] - A single molecule with index-addressed atoms and cached connectivity
//! - [`mapping`] - One-to-one atom index correspondence between two molecules
//! - [`system`] - An ordered collection of molecules and the builder used by file readers
//! - [`merged`] - The dual-topology molecule produced by merging two ligands
//!
//! ## Usage
//!
//! ```ignore
//! use fepmerge::core::models::{atom::Atom, element::Element, molecule::Molecule};
//!
//! let mut ligand = Molecule::new("LIG");
//! let c1 = ligand.add_atom(Atom::new("C1", Element::C, Point3::new(0.0, 0.0, 0.0)));
//! let o1 = ligand.add_atom(Atom::new("O1", Element::O, Point3::new(1.2, 0.0, 0.0)));
//! ligand.add_bond(c1, o1, BondOrder::Double);
//! ```

pub mod atom;
pub mod element;
pub mod mapping;
pub mod merged;
pub mod molecule;
pub mod system;
pub mod topology;
