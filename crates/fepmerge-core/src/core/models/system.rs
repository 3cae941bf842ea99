use super::atom::Atom;
use super::molecule::Molecule;
use super::topology::BondOrder;
use std::collections::HashMap;

/// An ordered collection of molecules, as loaded from one or more files.
///
/// Molecule order is the order in which each molecule's first atom appeared
/// in the source file, and it is preserved by every writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MolecularSystem {
    molecules: Vec<Molecule>,
}

impl MolecularSystem {
    pub fn from_molecules(molecules: Vec<Molecule>) -> Self {
        Self { molecules }
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn molecule(&self, index: usize) -> Option<&Molecule> {
        self.molecules.get(index)
    }

    pub fn len(&self) -> usize {
        self.molecules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }

    /// Total number of atoms over all molecules.
    pub fn atom_count(&self) -> usize {
        self.molecules.iter().map(Molecule::len).sum()
    }

    /// Iterates over every atom in system order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.molecules.iter().flat_map(|m| m.atoms().iter())
    }

    /// Removes and returns the molecule at `index`, shifting later molecules down.
    pub fn remove_molecule(&mut self, index: usize) -> Option<Molecule> {
        if index >= self.molecules.len() {
            return None;
        }
        Some(self.molecules.remove(index))
    }

    /// Inserts a molecule at `index` (which may equal the current length).
    pub fn insert_molecule(&mut self, index: usize, molecule: Molecule) -> Option<()> {
        if index > self.molecules.len() {
            return None;
        }
        self.molecules.insert(index, molecule);
        Some(())
    }

    /// Removes the molecule at `index` and puts `molecule` in its place.
    ///
    /// # Return
    ///
    /// Returns the molecule that was replaced, or `None` if `index` is out of range.
    pub fn replace_molecule(&mut self, index: usize, molecule: Molecule) -> Option<Molecule> {
        let old = self.remove_molecule(index)?;
        self.insert_molecule(index, molecule)?;
        Some(old)
    }
}

/// Incrementally assembles a [`MolecularSystem`] from file records.
///
/// Readers add atoms keyed by their file serial number and bonds between
/// serials; [`MolecularSystemBuilder::build`] then splits the atoms into
/// molecules by bond connectivity.
#[derive(Debug, Default)]
pub struct MolecularSystemBuilder {
    atoms: Vec<Atom>,
    serial_map: HashMap<usize, usize>,
    bonds: Vec<(usize, usize, BondOrder)>,
    group_by_residue: bool,
}

impl MolecularSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an atom with the given file serial number.
    ///
    /// # Return
    ///
    /// Returns `None` if the serial has already been used.
    pub fn add_atom(&mut self, serial: usize, atom: Atom) -> Option<()> {
        if self.serial_map.contains_key(&serial) {
            return None;
        }
        self.serial_map.insert(serial, self.atoms.len());
        self.atoms.push(atom);
        Some(())
    }

    /// Records a bond between two serials.
    ///
    /// # Return
    ///
    /// Returns `None` if either serial is unknown.
    pub fn add_bond(&mut self, serial1: usize, serial2: usize, order: BondOrder) -> Option<()> {
        let i = *self.serial_map.get(&serial1)?;
        let j = *self.serial_map.get(&serial2)?;
        self.bonds.push((i, j, order));
        Some(())
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Also keeps atoms of the same residue name and number in one molecule,
    /// for files that carry no connectivity.
    pub fn group_by_residue(&mut self) {
        self.group_by_residue = true;
    }

    pub fn build(self) -> MolecularSystem {
        let n = self.atoms.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        let mut links: Vec<(usize, usize)> = self.bonds.iter().map(|&(i, j, _)| (i, j)).collect();
        if self.group_by_residue {
            let mut first_of_residue: HashMap<(&str, isize), usize> = HashMap::new();
            for (i, atom) in self.atoms.iter().enumerate() {
                let key = (atom.residue_name.as_str(), atom.residue_number);
                let first = *first_of_residue.entry(key).or_insert(i);
                if first != i {
                    links.push((first, i));
                }
            }
        }

        for (i, j) in links {
            let ri = find(&mut parent, i);
            let rj = find(&mut parent, j);
            if ri != rj {
                // Keep the lower index as root so molecule order follows first appearance.
                let (lo, hi) = (ri.min(rj), ri.max(rj));
                parent[hi] = lo;
            }
        }

        let mut molecule_of_root: HashMap<usize, usize> = HashMap::new();
        let mut local_index = vec![0usize; n];
        let mut molecule_index = vec![0usize; n];
        let mut molecules: Vec<Molecule> = Vec::new();

        for (i, atom) in self.atoms.into_iter().enumerate() {
            let root = find(&mut parent, i);
            let mol_idx = *molecule_of_root.entry(root).or_insert_with(|| {
                molecules.push(Molecule::new(&atom.residue_name));
                molecules.len() - 1
            });
            molecule_index[i] = mol_idx;
            local_index[i] = molecules[mol_idx].add_atom(atom);
        }

        for (i, j, order) in self.bonds {
            let mol = &mut molecules[molecule_index[i]];
            mol.add_bond(local_index[i], local_index[j], order);
        }

        MolecularSystem { molecules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;
    use nalgebra::Point3;

    fn atom(name: &str, element: Element, res: &str) -> Atom {
        Atom::new(name, element, Point3::origin()).with_residue(res, 1)
    }

    fn two_molecule_system() -> MolecularSystem {
        let mut builder = MolecularSystemBuilder::new();
        builder.add_atom(1, atom("C1", Element::C, "LIG")).unwrap();
        builder.add_atom(2, atom("O", Element::O, "HOH")).unwrap();
        builder.add_atom(3, atom("C2", Element::C, "LIG")).unwrap();
        builder.add_atom(4, atom("H1", Element::H, "HOH")).unwrap();
        builder.add_bond(1, 3, BondOrder::Double).unwrap();
        builder.add_bond(2, 4, BondOrder::Single).unwrap();
        builder.build()
    }

    #[test]
    fn builder_splits_molecules_by_connectivity() {
        let system = two_molecule_system();
        assert_eq!(system.len(), 2);
        assert_eq!(system.atom_count(), 4);

        let lig = system.molecule(0).unwrap();
        assert_eq!(lig.name, "LIG");
        assert_eq!(lig.len(), 2);
        assert_eq!(lig.atom(1).unwrap().name, "C2");
        assert_eq!(lig.bonds()[0].order, BondOrder::Double);

        let water = system.molecule(1).unwrap();
        assert_eq!(water.name, "HOH");
        assert!(water.are_bonded(0, 1));
    }

    #[test]
    fn builder_keeps_unbonded_atoms_as_separate_molecules() {
        let mut builder = MolecularSystemBuilder::new();
        builder.add_atom(10, atom("NA", Element::Na, "NA")).unwrap();
        builder.add_atom(11, atom("CL", Element::Cl, "CL")).unwrap();
        let system = builder.build();
        assert_eq!(system.len(), 2);
        assert_eq!(system.molecule(1).unwrap().atom(0).unwrap().name, "CL");
    }

    #[test]
    fn builder_rejects_duplicate_serials_and_unknown_bonds() {
        let mut builder = MolecularSystemBuilder::new();
        builder.add_atom(1, atom("C1", Element::C, "LIG")).unwrap();
        assert!(builder.add_atom(1, atom("C2", Element::C, "LIG")).is_none());
        assert!(builder.add_bond(1, 99, BondOrder::Single).is_none());
        assert_eq!(builder.atom_count(), 1);
    }

    #[test]
    fn replace_molecule_keeps_position() {
        let mut system = two_molecule_system();
        let replacement = Molecule::new("MRG");
        let old = system.replace_molecule(0, replacement).unwrap();
        assert_eq!(old.name, "LIG");
        assert_eq!(system.molecule(0).unwrap().name, "MRG");
        assert_eq!(system.molecule(1).unwrap().name, "HOH");
        assert!(system.replace_molecule(5, Molecule::new("X")).is_none());
    }

    #[test]
    fn insert_and_remove_respect_bounds() {
        let mut system = two_molecule_system();
        assert!(system.insert_molecule(3, Molecule::new("X")).is_none());
        system.insert_molecule(2, Molecule::new("END")).unwrap();
        assert_eq!(system.molecule(2).unwrap().name, "END");
        assert!(system.remove_molecule(3).is_none());
        assert_eq!(system.remove_molecule(0).unwrap().name, "LIG");
        assert_eq!(system.len(), 2);
    }
}
