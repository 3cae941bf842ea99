use super::config::MappingConfig;
use super::error::EngineError;
use super::search::SubstructureSearch;
use crate::core::io::mapping::read_csv_mapping_from_path;
use crate::core::models::mapping::AtomMapping;
use crate::core::models::molecule::Molecule;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where a resolved mapping came from.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingSource {
    File(PathBuf),
    Search { candidates: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    pub mapping: AtomMapping,
    /// RMSD of the chosen candidate; `None` for a mapping read from file.
    pub score: Option<f64>,
    pub source: MappingSource,
}

/// Produces the atom mapping from `a` to `b`.
///
/// A configured mapping file is used as-is and the search is never invoked.
/// Otherwise the search is asked for up to `max_candidates` mappings and the
/// one with the lowest score wins, whatever order they were returned in.
pub fn resolve(
    a: &Molecule,
    b: &Molecule,
    config: &MappingConfig,
    search: &dyn SubstructureSearch,
) -> Result<ResolvedMapping, EngineError> {
    if let Some(path) = &config.mapping_file {
        let mapping = read_csv_mapping_from_path(path)?;
        info!(path = %path.display(), pairs = mapping.len(), "Using atom mapping from file.");
        return Ok(ResolvedMapping {
            mapping,
            score: None,
            source: MappingSource::File(path.clone()),
        });
    }

    let candidates = search.search(
        a,
        b,
        &config.prematch,
        config.max_candidates,
        config.timeout,
    )?;
    let count = candidates.len();
    debug!(candidates = count, "Substructure search returned.");

    let best = candidates
        .into_iter()
        .min_by(|x, y| x.score.total_cmp(&y.score))
        .ok_or_else(|| EngineError::NoMapping {
            molecule0: a.name.clone(),
            molecule1: b.name.clone(),
        })?;

    info!(
        pairs = best.mapping.len(),
        rmsd = best.score,
        "Selected lowest-RMSD mapping."
    );
    Ok(ResolvedMapping {
        mapping: best.mapping,
        score: Some(best.score),
        source: MappingSource::Search { candidates: count },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::mapping::MappingFileError;
    use crate::engine::config::MergeConfigBuilder;
    use crate::engine::search::{ScoredMapping, SearchError};
    use std::cell::Cell;
    use std::time::Duration;

    struct CannedSearch {
        results: Vec<ScoredMapping>,
        calls: Cell<usize>,
        requested: Cell<usize>,
    }

    impl CannedSearch {
        fn new(results: Vec<ScoredMapping>) -> Self {
            Self {
                results,
                calls: Cell::new(0),
                requested: Cell::new(0),
            }
        }
    }

    impl SubstructureSearch for CannedSearch {
        fn search(
            &self,
            _a: &Molecule,
            _b: &Molecule,
            _prematch: &AtomMapping,
            max_candidates: usize,
            _timeout: Duration,
        ) -> Result<Vec<ScoredMapping>, SearchError> {
            self.calls.set(self.calls.get() + 1);
            self.requested.set(max_candidates);
            Ok(self.results.clone())
        }
    }

    struct TimingOut;

    impl SubstructureSearch for TimingOut {
        fn search(
            &self,
            _a: &Molecule,
            _b: &Molecule,
            _prematch: &AtomMapping,
            _max_candidates: usize,
            timeout: Duration,
        ) -> Result<Vec<ScoredMapping>, SearchError> {
            Err(SearchError::Timeout(timeout))
        }
    }

    fn scored(pairs: &[(usize, usize)], score: f64) -> ScoredMapping {
        ScoredMapping {
            mapping: AtomMapping::from_pairs(pairs.iter().copied()).unwrap(),
            score,
        }
    }

    #[test]
    fn mapping_file_bypasses_the_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.csv");
        std::fs::write(&path, "# idxA,idxB\n2,0\n0,1\n").unwrap();
        let config = MergeConfigBuilder::new()
            .mapping_file(path.clone())
            .build()
            .unwrap();
        let search = CannedSearch::new(vec![scored(&[(0, 0)], 0.0)]);

        let resolved = resolve(&Molecule::new("A"), &Molecule::new("B"), &config.mapping, &search)
            .unwrap();
        assert_eq!(search.calls.get(), 0);
        assert_eq!(resolved.mapping.pairs(), &[(2, 0), (0, 1)]);
        assert_eq!(resolved.score, None);
        assert_eq!(resolved.source, MappingSource::File(path));
    }

    #[test]
    fn lowest_score_wins_regardless_of_order() {
        let config = MergeConfigBuilder::new().build().unwrap();
        let search = CannedSearch::new(vec![
            scored(&[(0, 1)], 0.9),
            scored(&[(0, 0)], 0.1),
            scored(&[(1, 0)], 0.5),
        ]);
        let resolved = resolve(&Molecule::new("A"), &Molecule::new("B"), &config.mapping, &search)
            .unwrap();
        assert_eq!(search.calls.get(), 1);
        assert_eq!(search.requested.get(), 10);
        assert_eq!(resolved.mapping.pairs(), &[(0, 0)]);
        assert_eq!(resolved.score, Some(0.1));
        assert_eq!(resolved.source, MappingSource::Search { candidates: 3 });
    }

    #[test]
    fn empty_search_result_is_no_mapping() {
        let config = MergeConfigBuilder::new().build().unwrap();
        let search = CannedSearch::new(Vec::new());
        let err = resolve(&Molecule::new("A"), &Molecule::new("B"), &config.mapping, &search)
            .unwrap_err();
        assert!(matches!(err, EngineError::NoMapping { .. }));
    }

    #[test]
    fn search_timeout_is_fatal() {
        let config = MergeConfigBuilder::new()
            .timeout(Duration::from_millis(5))
            .build()
            .unwrap();
        let err = resolve(&Molecule::new("A"), &Molecule::new("B"), &config.mapping, &TimingOut)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Search(SearchError::Timeout(d)) if d == Duration::from_millis(5)
        ));
    }

    #[test]
    fn malformed_mapping_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.csv");
        std::fs::write(&path, "0,1\nnot,a-number\n").unwrap();
        let config = MergeConfigBuilder::new().mapping_file(path).build().unwrap();
        let err = resolve(
            &Molecule::new("A"),
            &Molecule::new("B"),
            &config.mapping,
            &CannedSearch::new(Vec::new()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::MappingFile(MappingFileError::Csv { line: 2, .. })
        ));
    }
}
