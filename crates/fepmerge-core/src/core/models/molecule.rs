use super::atom::Atom;
use super::topology::{Bond, BondOrder};
use nalgebra::{Isometry3, Point3, Vector3};

/// A single molecule: an ordered list of atoms and the bonds between them.
///
/// The atom index (position in [`Molecule::atoms`]) is the stable identifier
/// used by atom mappings, mapping files and every writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    /// Molecule name, usually the residue name of its first atom.
    pub name: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// Cached adjacency list for bond connectivity, indexed by atom index.
    adjacency: Vec<Vec<usize>>,
}

impl Molecule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Appends an atom and returns its index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Adds a bond between two atoms.
    ///
    /// Adding an existing bond succeeds without creating a duplicate.
    ///
    /// # Return
    ///
    /// Returns `None` if either index is out of range or both indices are equal.
    pub fn add_bond(&mut self, atom1: usize, atom2: usize, order: BondOrder) -> Option<()> {
        if atom1 >= self.atoms.len() || atom2 >= self.atoms.len() || atom1 == atom2 {
            return None;
        }
        if self.adjacency[atom1].contains(&atom2) {
            return Some(());
        }

        self.bonds.push(Bond::new(atom1, atom2, order));
        self.adjacency[atom1].push(atom2);
        self.adjacency[atom2].push(atom1);
        Some(())
    }

    /// Returns the atoms directly bonded to `index` (empty if out of range).
    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map_or(&[], |n| n.as_slice())
    }

    pub fn are_bonded(&self, atom1: usize, atom2: usize) -> bool {
        self.neighbors(atom1).contains(&atom2)
    }

    pub fn bond_between(&self, atom1: usize, atom2: usize) -> Option<&Bond> {
        if !self.are_bonded(atom1, atom2) {
            return None;
        }
        self.bonds
            .iter()
            .find(|b| b.contains(atom1) && b.contains(atom2))
    }

    /// Indices of all non-hydrogen atoms, in atom order.
    pub fn heavy_atoms(&self) -> Vec<usize> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_hydrogen())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    pub fn translate(&mut self, shift: &Vector3<f64>) {
        for atom in &mut self.atoms {
            atom.position += shift;
        }
    }

    /// Applies a rigid-body transform to every atom.
    pub fn transform(&mut self, isometry: &Isometry3<f64>) {
        for atom in &mut self.atoms {
            atom.position = isometry * atom.position;
        }
    }
}
