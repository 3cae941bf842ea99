use crate::core::models::merged::MergedMolecule;
use crate::core::models::molecule::Molecule;
use crate::core::models::system::MolecularSystem;
use crate::engine::config::{MappingConfig, MergeConfig};
use crate::engine::error::EngineError;
use crate::engine::merge::{align, merge, merge_into_system};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::resolver::{ResolvedMapping, resolve};
use crate::engine::search::SubstructureSearch;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The lambda=0 system with the perturbed molecule replaced by the merge.
    pub system: MolecularSystem,
    pub merged: MergedMolecule,
    pub mapping: ResolvedMapping,
    /// The perturbed molecule at lambda=0, as loaded.
    pub molecule0: Molecule,
    /// The perturbed molecule at lambda=1, aligned onto `molecule0`.
    pub molecule1: Molecule,
}

fn pick_molecule(
    system: &MolecularSystem,
    index: usize,
    state: &'static str,
) -> Result<Molecule, EngineError> {
    system
        .molecule(index)
        .cloned()
        .ok_or(EngineError::MoleculeNotFound {
            state,
            index,
            len: system.len(),
        })
}

/// Resolves the atom mapping between the selected molecules of two systems.
#[instrument(skip_all, name = "mapping_workflow")]
pub fn resolve_mapping(
    system0: &MolecularSystem,
    system1: &MolecularSystem,
    molecule0: usize,
    molecule1: usize,
    config: &MappingConfig,
    search: &dyn SubstructureSearch,
    reporter: &ProgressReporter,
) -> Result<(Molecule, Molecule, ResolvedMapping), EngineError> {
    let a = pick_molecule(system0, molecule0, "lambda=0")?;
    let b = pick_molecule(system1, molecule1, "lambda=1")?;
    info!(
        molecule0 = %a.name,
        atoms0 = a.len(),
        molecule1 = %b.name,
        atoms1 = b.len(),
        "Resolving atom mapping."
    );
    let resolved = reporter.phase("Resolving Atom Mapping", || resolve(&a, &b, config, search))?;
    Ok((a, b, resolved))
}

#[instrument(skip_all, name = "merge_workflow")]
pub fn run(
    system0: &MolecularSystem,
    system1: &MolecularSystem,
    config: &MergeConfig,
    search: &dyn SubstructureSearch,
    reporter: &ProgressReporter,
) -> Result<MergeResult, EngineError> {
    // === Phase 1: Mapping ===
    let (molecule0, molecule1, mapping) = resolve_mapping(
        system0,
        system1,
        config.molecule0,
        config.molecule1,
        &config.mapping,
        search,
        reporter,
    )?;
    if let Some(score) = mapping.score {
        reporter.report(Progress::Message(format!(
            "Mapped {} atom pair(s), RMSD {:.3} Å",
            mapping.mapping.len(),
            score
        )));
    }

    // === Phase 2: Alignment and merge ===
    let (aligned, merged) = reporter.phase("Aligning and Merging", || {
        let aligned = align(&molecule0, &molecule1, &mapping.mapping)?;
        let merged = merge(&molecule0, &aligned, &mapping.mapping, config.policy)?;
        Ok::<_, EngineError>((aligned, merged))
    })?;

    // === Phase 3: Substitution ===
    let mut system = system0.clone();
    merge_into_system(&mut system, config.molecule0, &merged)?;

    info!(
        atoms = merged.len(),
        system_atoms = system.atom_count(),
        "Merge workflow complete."
    );
    Ok(MergeResult {
        system,
        merged,
        mapping,
        molecule0,
        molecule1: aligned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use crate::engine::config::MergeConfigBuilder;
    use crate::engine::search::McsSearch;
    use nalgebra::Point3;

    fn one_atom(name: &str, element: Element, x: f64) -> MolecularSystem {
        let mut mol = Molecule::new(name);
        mol.add_atom(Atom::new(name, element, Point3::new(x, 0.0, 0.0)).with_residue(name, 1));
        MolecularSystem::from_molecules(vec![mol])
    }

    #[test]
    fn one_atom_systems_merge_without_dummies() {
        let system0 = one_atom("NA", Element::Na, 0.0);
        let system1 = one_atom("NA", Element::Na, 3.0);
        let config = MergeConfigBuilder::new().build().unwrap();
        let result = run(
            &system0,
            &system1,
            &config,
            &McsSearch::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(result.mapping.mapping.pairs(), &[(0, 0)]);
        assert_eq!(result.merged.len(), 1);
        assert_eq!(result.merged.dummy_count_at_lambda0(), 0);
        assert_eq!(result.merged.dummy_count_at_lambda1(), 0);
        assert!(result.molecule1.atoms()[0].position.coords.norm() < 1e-10);
        assert_eq!(result.system.atom_count(), 1);
    }

    #[test]
    fn missing_molecule_index_is_reported() {
        let system = one_atom("NA", Element::Na, 0.0);
        let config = MergeConfigBuilder::new().molecule1(2).build().unwrap();
        let err = run(
            &system,
            &system,
            &config,
            &McsSearch::default(),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::MoleculeNotFound {
                state: "lambda=1",
                index: 2,
                len: 1
            }
        ));
    }
}
