use crate::core::models::mapping::AtomMapping;
use crate::core::models::molecule::Molecule;
use crate::core::topology::rings::RingInfo;
use crate::core::utils::geometry::superpose;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("Substructure search did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Invalid prematch pair {a}-{b}: {reason}")]
    InvalidPrematch { a: usize, b: usize, reason: String },
}

/// A candidate atom mapping with its quality score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMapping {
    pub mapping: AtomMapping,
    /// RMSD in Angstroms of the mapped atoms after optimal superposition.
    pub score: f64,
}

/// Finds candidate atom mappings between two molecules.
pub trait SubstructureSearch {
    /// Returns up to `max_candidates` mappings from atoms of `a` to atoms of
    /// `b`, each containing every pair of `prematch`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Timeout`] if the search does not finish within
    /// `timeout`.
    fn search(
        &self,
        a: &Molecule,
        b: &Molecule,
        prematch: &AtomMapping,
        max_candidates: usize,
        timeout: Duration,
    ) -> Result<Vec<ScoredMapping>, SearchError>;
}

/// Maximum common substructure search over the heavy-atom graphs.
///
/// Heavy atoms are matched by element as a connected, induced common
/// subgraph; every mapping of maximum size is a candidate. Each candidate is
/// then extended with hydrogens, paired greedily by distance after aligning
/// `b` onto `a`, and scored by RMSD. Candidates come back best first.
#[derive(Debug, Clone, Copy)]
pub struct McsSearch {
    /// Only match ring atoms to ring atoms and chain atoms to chain atoms.
    pub ring_matches_ring_only: bool,
}

impl Default for McsSearch {
    fn default() -> Self {
        Self {
            ring_matches_ring_only: true,
        }
    }
}

impl SubstructureSearch for McsSearch {
    fn search(
        &self,
        a: &Molecule,
        b: &Molecule,
        prematch: &AtomMapping,
        max_candidates: usize,
        timeout: Duration,
    ) -> Result<Vec<ScoredMapping>, SearchError> {
        if max_candidates == 0 || a.is_empty() || b.is_empty() {
            return Ok(Vec::new());
        }
        validate_prematch(a, b, prematch)?;

        // A timeout too large to represent as an instant means no deadline.
        let deadline = Instant::now().checked_add(timeout);
        let mut state = HeavySearch::new(a, b, *self, max_candidates, deadline, timeout);
        for &(i, j) in prematch.pairs() {
            if !a.atoms()[i].is_hydrogen() {
                state.push(i, j);
            }
        }
        state.run()?;
        debug!(
            nodes = state.nodes,
            best_size = state.best_size,
            found = state.best.len(),
            "Heavy-atom search finished."
        );

        let heavy_candidates = if state.best.is_empty() {
            vec![state.pairs.clone()]
        } else {
            std::mem::take(&mut state.best)
        };

        let prematch_hydrogens: Vec<(usize, usize)> = prematch
            .pairs()
            .iter()
            .copied()
            .filter(|&(i, _)| a.atoms()[i].is_hydrogen())
            .collect();

        let mut scored = Vec::with_capacity(heavy_candidates.len());
        for heavy in heavy_candidates {
            if expired(deadline) {
                return Err(SearchError::Timeout(timeout));
            }
            if let Some(candidate) = complete_candidate(a, b, &heavy, &prematch_hydrogens) {
                scored.push(candidate);
            }
        }

        scored.sort_by(|x, y| x.score.total_cmp(&y.score));
        scored.truncate(max_candidates);
        Ok(scored)
    }
}

fn validate_prematch(a: &Molecule, b: &Molecule, prematch: &AtomMapping) -> Result<(), SearchError> {
    for &(i, j) in prematch.pairs() {
        let invalid = |reason: String| SearchError::InvalidPrematch { a: i, b: j, reason };
        let atom_a = a
            .atom(i)
            .ok_or_else(|| invalid(format!("atom {} is out of range for '{}'", i, a.name)))?;
        let atom_b = b
            .atom(j)
            .ok_or_else(|| invalid(format!("atom {} is out of range for '{}'", j, b.name)))?;
        if atom_a.element != atom_b.element {
            return Err(invalid(format!(
                "elements differ ({} vs {})",
                atom_a.element, atom_b.element
            )));
        }
    }
    Ok(())
}

/// Backtracking state for the connected heavy-atom common subgraph search.
struct HeavySearch<'a> {
    a: &'a Molecule,
    b: &'a Molecule,
    a_heavy: Vec<usize>,
    b_heavy_free: Vec<bool>,
    a_rings: RingInfo,
    b_rings: RingInfo,
    options: McsSearch,
    pairs: Vec<(usize, usize)>,
    a_mapped: Vec<bool>,
    forbidden: Vec<bool>,
    best: Vec<Vec<(usize, usize)>>,
    best_size: usize,
    seen: HashSet<Vec<(usize, usize)>>,
    cap: usize,
    deadline: Option<Instant>,
    timeout: Duration,
    nodes: u64,
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() > d)
}

impl<'a> HeavySearch<'a> {
    fn new(
        a: &'a Molecule,
        b: &'a Molecule,
        options: McsSearch,
        cap: usize,
        deadline: Option<Instant>,
        timeout: Duration,
    ) -> Self {
        Self {
            a,
            b,
            a_heavy: a.heavy_atoms(),
            b_heavy_free: b.atoms().iter().map(|x| !x.is_hydrogen()).collect(),
            a_rings: RingInfo::perceive(a),
            b_rings: RingInfo::perceive(b),
            options,
            pairs: Vec::new(),
            a_mapped: vec![false; a.len()],
            forbidden: vec![false; a.len()],
            best: Vec::new(),
            best_size: 0,
            seen: HashSet::new(),
            cap,
            deadline,
            timeout,
            nodes: 0,
        }
    }

    fn push(&mut self, i: usize, j: usize) {
        self.pairs.push((i, j));
        self.a_mapped[i] = true;
        self.b_heavy_free[j] = false;
    }

    fn pop(&mut self) {
        if let Some((i, j)) = self.pairs.pop() {
            self.a_mapped[i] = false;
            self.b_heavy_free[j] = true;
        }
    }

    fn run(&mut self) -> Result<(), SearchError> {
        if !self.pairs.is_empty() {
            self.record();
            return self.extend();
        }

        // Each connected mapping is enumerated from its lowest-index A atom only.
        let seeds = self.a_heavy.clone();
        for i in seeds {
            let targets = self.compatible_targets(i);
            for j in targets {
                self.push(i, j);
                self.record();
                self.extend()?;
                self.pop();
            }
            self.forbidden[i] = true;
        }
        Ok(())
    }

    fn extend(&mut self) -> Result<(), SearchError> {
        self.nodes += 1;
        if expired(self.deadline) {
            return Err(SearchError::Timeout(self.timeout));
        }

        let potential = self.pairs.len() + self.upper_bound();
        if potential < self.best_size || (potential == self.best_size && self.best.len() >= self.cap)
        {
            return Ok(());
        }

        let Some(next) = self.next_frontier_atom() else {
            return Ok(());
        };

        for j in self.compatible_targets(next) {
            self.push(next, j);
            self.record();
            self.extend()?;
            self.pop();
        }

        self.forbidden[next] = true;
        let result = self.extend();
        self.forbidden[next] = false;
        result
    }

    /// Largest number of further pairs any extension could still add.
    fn upper_bound(&self) -> usize {
        let mut available_a: HashMap<u8, usize> = HashMap::new();
        for &i in &self.a_heavy {
            if !self.a_mapped[i] && !self.forbidden[i] {
                *available_a.entry(self.a.atoms()[i].element.atomic_number()).or_default() += 1;
            }
        }
        let mut available_b: HashMap<u8, usize> = HashMap::new();
        for (j, &free) in self.b_heavy_free.iter().enumerate() {
            if free {
                *available_b.entry(self.b.atoms()[j].element.atomic_number()).or_default() += 1;
            }
        }
        available_a
            .iter()
            .map(|(z, &n)| n.min(available_b.get(z).copied().unwrap_or(0)))
            .sum()
    }

    fn next_frontier_atom(&self) -> Option<usize> {
        self.a_heavy.iter().copied().find(|&i| {
            !self.a_mapped[i]
                && !self.forbidden[i]
                && self.a.neighbors(i).iter().any(|&n| self.a_mapped[n])
        })
    }

    /// Free heavy atoms of B that `i` can map to without breaking the induced
    /// subgraph: every mapped pair must agree on bondedness.
    fn compatible_targets(&self, i: usize) -> Vec<usize> {
        let atom = &self.a.atoms()[i];
        (0..self.b.len())
            .filter(|&j| {
                self.b_heavy_free[j]
                    && self.b.atoms()[j].element == atom.element
                    && (!self.options.ring_matches_ring_only
                        || self.a_rings.is_in_ring(i) == self.b_rings.is_in_ring(j))
                    && self
                        .pairs
                        .iter()
                        .all(|&(pi, pj)| self.a.are_bonded(i, pi) == self.b.are_bonded(j, pj))
            })
            .collect()
    }

    fn record(&mut self) {
        let size = self.pairs.len();
        if size < self.best_size || (size == self.best_size && self.best.len() >= self.cap) {
            return;
        }
        let mut key = self.pairs.clone();
        key.sort_unstable();
        if !self.seen.insert(key.clone()) {
            return;
        }
        if size > self.best_size {
            self.best_size = size;
            self.best.clear();
        }
        self.best.push(key);
    }
}

fn positions(molecule: &Molecule, indices: impl Iterator<Item = usize>) -> Vec<Point3<f64>> {
    indices.map(|i| molecule.atoms()[i].position).collect()
}

/// Adds hydrogens to a heavy-atom mapping and scores the result.
fn complete_candidate(
    a: &Molecule,
    b: &Molecule,
    heavy: &[(usize, usize)],
    prematch_hydrogens: &[(usize, usize)],
) -> Option<ScoredMapping> {
    let b_positions: Vec<Point3<f64>> = match superpose(
        &positions(b, heavy.iter().map(|p| p.1)),
        &positions(a, heavy.iter().map(|p| p.0)),
    ) {
        Some(fit) => b.positions().iter().map(|p| fit.isometry * p).collect(),
        None => b.positions(),
    };

    let mut pairs: Vec<(usize, usize)> = heavy.to_vec();
    let mut a_used: HashSet<usize> = pairs.iter().map(|p| p.0).collect();
    let mut b_used: HashSet<usize> = pairs.iter().map(|p| p.1).collect();
    for &(i, j) in prematch_hydrogens {
        if a_used.insert(i) && b_used.insert(j) {
            pairs.push((i, j));
        }
    }

    let heavy_image: HashMap<usize, usize> = heavy.iter().copied().collect();
    let mut options: Vec<(f64, usize, usize)> = Vec::new();
    for (i, atom) in a.atoms().iter().enumerate() {
        if !atom.is_hydrogen() || a_used.contains(&i) {
            continue;
        }
        for (j, other) in b.atoms().iter().enumerate() {
            if !other.is_hydrogen() || b_used.contains(&j) {
                continue;
            }
            // With heavy atoms mapped, a hydrogen pair must share mapped parents.
            let parents_match = heavy.is_empty()
                || a.neighbors(i).iter().any(|p| {
                    heavy_image
                        .get(p)
                        .is_some_and(|&q| b.are_bonded(q, j))
                });
            if parents_match {
                let distance = (atom.position - b_positions[j]).norm();
                options.push((distance, i, j));
            }
        }
    }
    options.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));
    for (_, i, j) in options {
        if !a_used.contains(&i) && !b_used.contains(&j) {
            a_used.insert(i);
            b_used.insert(j);
            pairs.push((i, j));
        }
    }

    if pairs.is_empty() {
        return None;
    }
    pairs.sort_unstable();

    let fit = superpose(
        &positions(b, pairs.iter().map(|p| p.1)),
        &positions(a, pairs.iter().map(|p| p.0)),
    )?;
    let mapping = AtomMapping::from_pairs(pairs).ok()?;
    Some(ScoredMapping {
        mapping,
        score: fit.rmsd,
    })
}
