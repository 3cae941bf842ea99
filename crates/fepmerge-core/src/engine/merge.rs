use super::config::MergePolicy;
use crate::core::models::mapping::AtomMapping;
use crate::core::models::merged::{EndState, MergedAtom, MergedBond, MergedMolecule, Presence};
use crate::core::models::molecule::Molecule;
use crate::core::models::system::MolecularSystem;
use crate::core::topology::rings::{RingInfo, is_ring_bond};
use crate::core::utils::geometry::superpose;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    #[error("Atom index {index} is out of range for molecule '{molecule}' ({len} atoms)")]
    IndexOutOfRange {
        index: usize,
        molecule: String,
        len: usize,
    },
    #[error("Cannot align molecules with an empty atom mapping")]
    EmptyMapping,
    #[error("Kabsch alignment failed")]
    AlignmentFailed,
    #[error("Mapping {a}-{b} breaks a ring (set allow_ring_breaking to permit this)")]
    RingBreaking { a: usize, b: usize },
    #[error(
        "Mapping {a}-{b} changes a ring size from {size0} to {size1} (set allow_ring_size_change to permit this)"
    )]
    RingSizeChange {
        a: usize,
        b: usize,
        size0: usize,
        size1: usize,
    },
    #[error("Molecule index {index} is out of range for a system of {len} molecules")]
    MoleculeOutOfRange { index: usize, len: usize },
}

fn check_indices(a: &Molecule, b: &Molecule, mapping: &AtomMapping) -> Result<(), MergeError> {
    let out_of_range = |index: usize, molecule: &Molecule| MergeError::IndexOutOfRange {
        index,
        molecule: molecule.name.clone(),
        len: molecule.len(),
    };
    for &(i, j) in mapping.pairs() {
        if i >= a.len() {
            return Err(out_of_range(i, a));
        }
        if j >= b.len() {
            return Err(out_of_range(j, b));
        }
    }
    Ok(())
}

/// Returns a copy of `b` rigidly moved onto `a`.
///
/// The fit uses the inverse of `mapping` (atoms of `b` paired with their
/// counterparts in `a`) and is applied to every atom of `b`. A single pair
/// gives a pure translation.
pub fn align(a: &Molecule, b: &Molecule, mapping: &AtomMapping) -> Result<Molecule, MergeError> {
    if mapping.is_empty() {
        return Err(MergeError::EmptyMapping);
    }
    check_indices(a, b, mapping)?;

    let inverse = mapping.inverse();
    let mobile: Vec<Point3<f64>> = inverse
        .pairs()
        .iter()
        .map(|&(j, _)| b.atoms()[j].position)
        .collect();
    let reference: Vec<Point3<f64>> = inverse
        .pairs()
        .iter()
        .map(|&(_, i)| a.atoms()[i].position)
        .collect();
    let fit = superpose(&mobile, &reference).ok_or(MergeError::AlignmentFailed)?;
    debug!(rmsd = fit.rmsd, pairs = inverse.len(), "Aligned lambda=1 molecule.");

    let mut aligned = b.clone();
    aligned.transform(&fit.isometry);
    Ok(aligned)
}

fn check_ring_policy(
    a: &Molecule,
    b: &Molecule,
    mapping: &AtomMapping,
    policy: MergePolicy,
) -> Result<(), MergeError> {
    if policy.allow_ring_breaking && policy.allow_ring_size_change {
        return Ok(());
    }
    let rings_a = RingInfo::perceive(a);
    let rings_b = RingInfo::perceive(b);

    for &(i, j) in mapping.pairs() {
        match (rings_a.smallest_ring_size(i), rings_b.smallest_ring_size(j)) {
            (Some(size0), Some(size1)) if size0 != size1 && !policy.allow_ring_size_change => {
                return Err(MergeError::RingSizeChange {
                    a: i,
                    b: j,
                    size0,
                    size1,
                });
            }
            (Some(_), None) | (None, Some(_)) if !policy.allow_ring_breaking => {
                return Err(MergeError::RingBreaking { a: i, b: j });
            }
            _ => {}
        }
    }

    if !policy.allow_ring_breaking {
        for bond in a.bonds() {
            let (Some(j1), Some(j2)) = (mapping.get(bond.atom1), mapping.get(bond.atom2)) else {
                continue;
            };
            if b.are_bonded(j1, j2)
                && is_ring_bond(a, bond.atom1, bond.atom2) != is_ring_bond(b, j1, j2)
            {
                return Err(MergeError::RingBreaking {
                    a: bond.atom1,
                    b: j1,
                });
            }
        }
    }
    Ok(())
}

/// Strips trailing digits from `name` and appends the smallest free number.
fn unique_name(name: &str, used: &HashSet<String>) -> String {
    if !used.contains(name) {
        return name.to_string();
    }
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    (1..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Combines `a` and `b` into a dual-topology molecule under `mapping`.
///
/// `b` is expected to be aligned onto `a` already; the positions of atoms that
/// exist only in `b` are taken from it unchanged. Atom names of `b`-only atoms
/// are made unique within the merged molecule.
pub fn merge(
    a: &Molecule,
    b: &Molecule,
    mapping: &AtomMapping,
    policy: MergePolicy,
) -> Result<MergedMolecule, MergeError> {
    check_indices(a, b, mapping)?;
    check_ring_policy(a, b, mapping, policy)?;

    let (residue_name, residue_number) = a
        .atoms()
        .first()
        .or_else(|| b.atoms().first())
        .map(|atom| (atom.residue_name.clone(), atom.residue_number))
        .unwrap_or_else(|| (a.name.clone(), 1));

    let mut atoms = Vec::with_capacity(a.len() + b.len() - mapping.len());
    let mut used_names: HashSet<String> = HashSet::new();
    for (i, atom) in a.atoms().iter().enumerate() {
        let lambda0 = EndState::from_atom(i, atom);
        let presence = match mapping.get(i) {
            Some(j) => Presence::Both {
                lambda0,
                lambda1: EndState::from_atom(j, &b.atoms()[j]),
            },
            None => Presence::Lambda0Only(lambda0),
        };
        used_names.insert(atom.name.clone());
        atoms.push(MergedAtom {
            presence,
            position: atom.position,
            residue_name: atom.residue_name.clone(),
            residue_number: atom.residue_number,
        });
    }

    let mut b_to_merged: Vec<usize> = Vec::with_capacity(b.len());
    for (j, atom) in b.atoms().iter().enumerate() {
        if let Some(i) = mapping.source_of(j) {
            b_to_merged.push(i);
            continue;
        }
        let mut lambda1 = EndState::from_atom(j, atom);
        lambda1.name = unique_name(&atom.name, &used_names);
        if lambda1.name != atom.name {
            debug!(from = %atom.name, to = %lambda1.name, "Renamed lambda=1 dummy atom.");
        }
        used_names.insert(lambda1.name.clone());
        b_to_merged.push(atoms.len());
        atoms.push(MergedAtom {
            presence: Presence::Lambda1Only(lambda1),
            position: atom.position,
            residue_name: residue_name.clone(),
            residue_number,
        });
    }

    let mut bonds: Vec<MergedBond> = Vec::new();
    let mut bond_index: HashMap<(usize, usize), usize> = HashMap::new();
    let key = |x: usize, y: usize| if x < y { (x, y) } else { (y, x) };
    for bond in a.bonds() {
        let k = key(bond.atom1, bond.atom2);
        bond_index.insert(k, bonds.len());
        bonds.push(MergedBond {
            atom1: k.0,
            atom2: k.1,
            order0: Some(bond.order),
            order1: None,
        });
    }
    for bond in b.bonds() {
        let k = key(b_to_merged[bond.atom1], b_to_merged[bond.atom2]);
        match bond_index.get(&k) {
            Some(&idx) => bonds[idx].order1 = Some(bond.order),
            None => {
                bond_index.insert(k, bonds.len());
                bonds.push(MergedBond {
                    atom1: k.0,
                    atom2: k.1,
                    order0: None,
                    order1: Some(bond.order),
                });
            }
        }
    }

    let merged = MergedMolecule {
        name: a.name.clone(),
        atoms,
        bonds,
    };
    info!(
        atoms = merged.len(),
        dummies0 = merged.dummy_count_at_lambda0(),
        dummies1 = merged.dummy_count_at_lambda1(),
        "Merged molecule built."
    );
    Ok(merged)
}

/// Replaces molecule `index` of `system` with the flattened merged molecule.
///
/// # Return
///
/// Returns the molecule that was replaced.
pub fn merge_into_system(
    system: &mut MolecularSystem,
    index: usize,
    merged: &MergedMolecule,
) -> Result<Molecule, MergeError> {
    let len = system.len();
    system
        .replace_molecule(index, merged.to_molecule())
        .ok_or(MergeError::MoleculeOutOfRange { index, len })
}
