use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MappingError {
    #[error("Atom {0} of the initial molecule is mapped more than once")]
    DuplicateSource(usize),
    #[error("Atom {0} of the final molecule is the target of more than one atom")]
    DuplicateTarget(usize),
}

/// A one-to-one correspondence between atom indices of two molecules.
///
/// Pairs keep the order in which they were inserted; both the source and the
/// target side are unique, so the mapping can always be inverted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomMapping {
    pairs: Vec<(usize, usize)>,
    forward: HashMap<usize, usize>,
    inverse: HashMap<usize, usize>,
}

impl AtomMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from `(source, target)` pairs, rejecting duplicates.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut mapping = Self::new();
        for (source, target) in pairs {
            mapping.insert(source, target)?;
        }
        Ok(mapping)
    }

    pub fn insert(&mut self, source: usize, target: usize) -> Result<(), MappingError> {
        if self.forward.contains_key(&source) {
            return Err(MappingError::DuplicateSource(source));
        }
        if self.inverse.contains_key(&target) {
            return Err(MappingError::DuplicateTarget(target));
        }
        self.pairs.push((source, target));
        self.forward.insert(source, target);
        self.inverse.insert(target, source);
        Ok(())
    }

    pub fn get(&self, source: usize) -> Option<usize> {
        self.forward.get(&source).copied()
    }

    pub fn source_of(&self, target: usize) -> Option<usize> {
        self.inverse.get(&target).copied()
    }

    pub fn contains_source(&self, source: usize) -> bool {
        self.forward.contains_key(&source)
    }

    pub fn contains_target(&self, target: usize) -> bool {
        self.inverse.contains_key(&target)
    }

    /// The pairs in insertion order.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The mapping from target to source, preserving pair order.
    pub fn inverse(&self) -> AtomMapping {
        AtomMapping {
            pairs: self.pairs.iter().map(|&(s, t)| (t, s)).collect(),
            forward: self.inverse.clone(),
            inverse: self.forward.clone(),
        }
    }

    /// The pairs sorted by source index.
    pub fn sorted_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = self.pairs.clone();
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_preserves_insertion_order() {
        let mapping = AtomMapping::from_pairs([(4, 8), (1, 3), (2, 2)]).unwrap();
        assert_eq!(mapping.pairs(), &[(4, 8), (1, 3), (2, 2)]);
        assert_eq!(mapping.sorted_pairs(), vec![(1, 3), (2, 2), (4, 8)]);
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn lookups_work_in_both_directions() {
        let mapping = AtomMapping::from_pairs([(1, 3), (4, 8)]).unwrap();
        assert_eq!(mapping.get(1), Some(3));
        assert_eq!(mapping.get(3), None);
        assert_eq!(mapping.source_of(8), Some(4));
        assert!(mapping.contains_source(4));
        assert!(mapping.contains_target(3));
        assert!(!mapping.contains_target(1));
    }

    #[test]
    fn duplicates_are_rejected() {
        assert_eq!(
            AtomMapping::from_pairs([(1, 3), (1, 4)]),
            Err(MappingError::DuplicateSource(1))
        );
        assert_eq!(
            AtomMapping::from_pairs([(1, 3), (2, 3)]),
            Err(MappingError::DuplicateTarget(3))
        );
    }

    #[test]
    fn inverse_swaps_sides() {
        let mapping = AtomMapping::from_pairs([(0, 5), (1, 6)]).unwrap();
        let inverse = mapping.inverse();
        assert_eq!(inverse.pairs(), &[(5, 0), (6, 1)]);
        assert_eq!(inverse.get(6), Some(1));
        assert_eq!(inverse.inverse(), mapping);
    }
}
