use super::atom::Atom;
use super::element::Element;
use super::molecule::Molecule;
use super::topology::BondOrder;
use nalgebra::Point3;

/// Force field type written for the dummy end of a perturbed atom.
pub const DUMMY_TYPE: &str = "du";

/// The properties of a merged atom at one end of the perturbation.
#[derive(Debug, Clone, PartialEq)]
pub struct EndState {
    /// Index of the atom in its source molecule.
    pub source_index: usize,
    pub name: String,
    pub element: Element,
    pub force_field_type: String,
    pub partial_charge: f64,
}

impl EndState {
    pub fn from_atom(source_index: usize, atom: &Atom) -> Self {
        Self {
            source_index,
            name: atom.name.clone(),
            element: atom.element,
            force_field_type: atom.force_field_type.clone(),
            partial_charge: atom.partial_charge,
        }
    }
}

/// Which end states a merged atom exists in.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    /// Mapped atom, present in both molecules.
    Both { lambda0: EndState, lambda1: EndState },
    /// Present only in the initial molecule; a dummy at lambda=1.
    Lambda0Only(EndState),
    /// Present only in the final molecule; a dummy at lambda=0.
    Lambda1Only(EndState),
}

/// An atom of a dual-topology molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAtom {
    pub presence: Presence,
    pub position: Point3<f64>,
    pub residue_name: String,
    pub residue_number: isize,
}

impl MergedAtom {
    pub fn lambda0(&self) -> Option<&EndState> {
        match &self.presence {
            Presence::Both { lambda0, .. } | Presence::Lambda0Only(lambda0) => Some(lambda0),
            Presence::Lambda1Only(_) => None,
        }
    }

    pub fn lambda1(&self) -> Option<&EndState> {
        match &self.presence {
            Presence::Both { lambda1, .. } | Presence::Lambda1Only(lambda1) => Some(lambda1),
            Presence::Lambda0Only(_) => None,
        }
    }

    /// The end state that carries the atom's identity for single-state output.
    fn primary(&self) -> &EndState {
        match &self.presence {
            Presence::Both { lambda0, .. } | Presence::Lambda0Only(lambda0) => lambda0,
            Presence::Lambda1Only(lambda1) => lambda1,
        }
    }

    pub fn name(&self) -> &str {
        &self.primary().name
    }

    pub fn element(&self) -> Element {
        self.primary().element
    }

    pub fn is_dummy_at_lambda0(&self) -> bool {
        self.lambda0().is_none()
    }

    pub fn is_dummy_at_lambda1(&self) -> bool {
        self.lambda1().is_none()
    }

    pub fn is_perturbed(&self) -> bool {
        match &self.presence {
            Presence::Both { lambda0, lambda1 } => {
                lambda0.force_field_type != lambda1.force_field_type
                    || (lambda0.partial_charge - lambda1.partial_charge).abs() > 1e-6
                    || lambda0.element != lambda1.element
            }
            _ => true,
        }
    }

    pub fn type_at_lambda0(&self) -> &str {
        self.lambda0()
            .map_or(DUMMY_TYPE, |s| s.force_field_type.as_str())
    }

    pub fn type_at_lambda1(&self) -> &str {
        self.lambda1()
            .map_or(DUMMY_TYPE, |s| s.force_field_type.as_str())
    }

    pub fn charge_at_lambda0(&self) -> f64 {
        self.lambda0().map_or(0.0, |s| s.partial_charge)
    }

    pub fn charge_at_lambda1(&self) -> f64 {
        self.lambda1().map_or(0.0, |s| s.partial_charge)
    }
}

/// A bond of the merged molecule with its order at each end state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedBond {
    pub atom1: usize,
    pub atom2: usize,
    pub order0: Option<BondOrder>,
    pub order1: Option<BondOrder>,
}

/// Two molecules combined under an atom mapping.
///
/// Atoms of the initial molecule come first in their original order, followed
/// by the atoms that exist only in the final molecule, in their original order.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedMolecule {
    pub name: String,
    pub atoms: Vec<MergedAtom>,
    pub bonds: Vec<MergedBond>,
}

impl MergedMolecule {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn dummy_count_at_lambda0(&self) -> usize {
        self.atoms.iter().filter(|a| a.is_dummy_at_lambda0()).count()
    }

    pub fn dummy_count_at_lambda1(&self) -> usize {
        self.atoms.iter().filter(|a| a.is_dummy_at_lambda1()).count()
    }

    pub fn total_charge_at_lambda0(&self) -> f64 {
        self.atoms.iter().map(MergedAtom::charge_at_lambda0).sum()
    }

    pub fn total_charge_at_lambda1(&self) -> f64 {
        self.atoms.iter().map(MergedAtom::charge_at_lambda1).sum()
    }

    /// Flattens the merged molecule into an ordinary molecule holding every
    /// merged atom with its lambda=0 properties (dummies typed `du`, zero charge).
    pub fn to_molecule(&self) -> Molecule {
        let mut molecule = Molecule::new(&self.name);
        for atom in &self.atoms {
            let flat = Atom::new(atom.name(), atom.element(), atom.position)
                .with_type(atom.type_at_lambda0())
                .with_charge(atom.charge_at_lambda0())
                .with_residue(&atom.residue_name, atom.residue_number);
            molecule.add_atom(flat);
        }
        for bond in &self.bonds {
            let order = bond.order0.or(bond.order1).unwrap_or_default();
            molecule.add_bond(bond.atom1, bond.atom2, order);
        }
        molecule
    }
}
