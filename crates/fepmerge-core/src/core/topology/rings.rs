use crate::core::models::molecule::Molecule;
use std::collections::VecDeque;

/// Ring membership of every atom in a molecule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingInfo {
    smallest: Vec<Option<usize>>,
}

impl RingInfo {
    /// Computes the smallest ring through each atom.
    pub fn perceive(molecule: &Molecule) -> Self {
        let smallest = (0..molecule.len())
            .map(|atom| {
                molecule
                    .neighbors(atom)
                    .iter()
                    .filter_map(|&n| smallest_ring_through_bond(molecule, atom, n))
                    .min()
            })
            .collect();
        Self { smallest }
    }

    pub fn is_in_ring(&self, atom: usize) -> bool {
        self.smallest_ring_size(atom).is_some()
    }

    /// Size of the smallest ring containing `atom`, or `None` for acyclic atoms.
    pub fn smallest_ring_size(&self, atom: usize) -> Option<usize> {
        self.smallest.get(atom).copied().flatten()
    }
}

/// Size of the smallest ring containing the bond `atom1`-`atom2`.
///
/// Returns `None` if the atoms are not bonded or the bond is not in a ring.
pub fn smallest_ring_through_bond(molecule: &Molecule, atom1: usize, atom2: usize) -> Option<usize> {
    if !molecule.are_bonded(atom1, atom2) {
        return None;
    }
    shortest_path_avoiding_bond(molecule, atom1, atom2).map(|path| path + 1)
}

pub fn is_ring_bond(molecule: &Molecule, atom1: usize, atom2: usize) -> bool {
    smallest_ring_through_bond(molecule, atom1, atom2).is_some()
}

/// Breadth-first distance from `start` to `goal` that never traverses the
/// direct `start`-`goal` bond.
fn shortest_path_avoiding_bond(molecule: &Molecule, start: usize, goal: usize) -> Option<usize> {
    let mut dist: Vec<Option<usize>> = vec![None; molecule.len()];
    let mut queue = VecDeque::new();
    dist[start] = Some(0);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let d = dist[current]?;
        for &next in molecule.neighbors(current) {
            if current == start && next == goal {
                continue;
            }
            if dist[next].is_some() {
                continue;
            }
            if next == goal {
                return Some(d + 1);
            }
            dist[next] = Some(d + 1);
            queue.push_back(next);
        }
    }
    None
}
