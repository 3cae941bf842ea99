use super::merge::MergeResult;
use crate::core::io::FileFormat;
use crate::core::io::amber::{write_prm7, write_rst7};
use crate::core::io::mapping::write_mapping_log;
use crate::core::io::pdb::PdbFile;
use crate::core::io::pert::write_pert;
use crate::core::io::traits::MolecularFile;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Paths of the files produced by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub prm7: PathBuf,
    pub rst7: PathBuf,
    pub pdb: PathBuf,
    pub pert: PathBuf,
    pub mapping: PathBuf,
}

impl OutputFiles {
    pub fn all(&self) -> [&Path; 5] {
        [
            self.prm7.as_path(),
            self.rst7.as_path(),
            self.pdb.as_path(),
            self.pert.as_path(),
            self.mapping.as_path(),
        ]
    }
}

/// `<output>.<ext>`, keeping any dots already in the file name.
pub fn output_path(output: &Path, format: FileFormat) -> PathBuf {
    let mut name: OsString = output.as_os_str().to_owned();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

fn create(path: &Path) -> Result<BufWriter<File>, EngineError> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Renames staged files to their destinations.
///
/// If a rename fails, the files already moved are removed again.
fn move_into_place(moves: &[(PathBuf, &Path)]) -> Result<(), EngineError> {
    for (done, (staged, destination)) in moves.iter().enumerate() {
        if let Err(e) = fs::rename(staged, destination) {
            for (_, moved) in &moves[..done] {
                if let Err(cleanup) = fs::remove_file(moved) {
                    debug!(path = %moved.display(), error = %cleanup, "Ignoring failure to roll back output.");
                }
            }
            return Err(e.into());
        }
        debug!(path = %destination.display(), "Wrote output file.");
    }
    Ok(())
}

/// Writes every output of a merge next to `output`.
///
/// Files are first written into a scratch directory beside the destination
/// and then renamed into place. A failed rename removes the outputs already
/// moved. The parent directory is created if needed.
#[instrument(skip_all, name = "output_writer", fields(output = %output.display()))]
pub fn write_outputs(
    result: &MergeResult,
    output: &Path,
    reporter: &ProgressReporter,
) -> Result<OutputFiles, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Writing Outputs",
    });
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    let scratch = tempfile::Builder::new()
        .prefix(".fepmerge-")
        .tempdir_in(&parent)?;
    let staged = |format: FileFormat| scratch.path().join(format!("merged.{}", format.extension()));
    reporter.report(Progress::TaskStart { total_steps: 5 });

    {
        let mut w = create(&staged(FileFormat::Prm7))?;
        write_prm7(&result.system, &mut w)?;
        w.flush()?;
    }
    reporter.report(Progress::TaskIncrement);
    {
        let mut w = create(&staged(FileFormat::Rst7))?;
        write_rst7(&result.system, &mut w)?;
        w.flush()?;
    }
    reporter.report(Progress::TaskIncrement);
    {
        let mut w = create(&staged(FileFormat::Pdb))?;
        PdbFile::write_to(&result.system, &mut w)?;
        w.flush()?;
    }
    reporter.report(Progress::TaskIncrement);
    {
        let mut w = create(&staged(FileFormat::Pert))?;
        write_pert(&result.merged, &mut w)?;
        w.flush()?;
    }
    reporter.report(Progress::TaskIncrement);
    {
        let mut w = create(&staged(FileFormat::Mapping))?;
        write_mapping_log(
            &result.molecule0,
            &result.molecule1,
            &result.mapping.mapping,
            &mut w,
        )?;
        w.flush()?;
    }
    reporter.report(Progress::TaskIncrement);

    let files = OutputFiles {
        prm7: output_path(output, FileFormat::Prm7),
        rst7: output_path(output, FileFormat::Rst7),
        pdb: output_path(output, FileFormat::Pdb),
        pert: output_path(output, FileFormat::Pert),
        mapping: output_path(output, FileFormat::Mapping),
    };
    let moves = [
        (staged(FileFormat::Prm7), files.prm7.as_path()),
        (staged(FileFormat::Rst7), files.rst7.as_path()),
        (staged(FileFormat::Pdb), files.pdb.as_path()),
        (staged(FileFormat::Pert), files.pert.as_path()),
        (staged(FileFormat::Mapping), files.mapping.as_path()),
    ];
    move_into_place(&moves)?;

    reporter.report(Progress::TaskFinish);

    if let Err(e) = scratch.close() {
        debug!(error = %e, "Ignoring failure to remove scratch directory.");
    }
    info!(files = files.all().len(), "Outputs written.");
    reporter.report(Progress::PhaseFinish);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::mapping::read_mapping_log;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::system::MolecularSystem;
    use crate::engine::config::MergeConfigBuilder;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::search::McsSearch;
    use crate::workflows::merge::run;
    use nalgebra::Point3;
    use std::io::BufReader;

    fn ion_system(x: f64) -> MolecularSystem {
        let mut mol = Molecule::new("NA");
        mol.add_atom(
            Atom::new("NA", Element::Na, Point3::new(x, 0.0, 0.0))
                .with_type("Na+")
                .with_charge(1.0)
                .with_residue("NA", 1),
        );
        MolecularSystem::from_molecules(vec![mol])
    }

    #[test]
    fn failed_rename_removes_files_already_moved() {
        let dir = tempfile::tempdir().unwrap();
        let staged_ok = dir.path().join("staged.prm7");
        fs::write(&staged_ok, "prm7").unwrap();
        let moved = dir.path().join("out.prm7");
        let missing = dir.path().join("never-written.rst7");
        let blocked = dir.path().join("out.rst7");

        let moves = [(staged_ok, moved.as_path()), (missing, blocked.as_path())];
        assert!(matches!(move_into_place(&moves), Err(EngineError::Io(_))));
        assert!(!moved.exists());
        assert!(!blocked.exists());
    }

    #[test]
    fn output_path_appends_extension() {
        assert_eq!(
            output_path(Path::new("out/lig.v2"), FileFormat::Prm7),
            PathBuf::from("out/lig.v2.prm7")
        );
    }

    #[test]
    fn writes_all_outputs_and_removes_scratch_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("merged");
        let config = MergeConfigBuilder::new().build().unwrap();
        let result = run(
            &ion_system(0.0),
            &ion_system(1.0),
            &config,
            &McsSearch::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        let files = write_outputs(&result, &output, &ProgressReporter::new()).unwrap();
        for path in files.all() {
            assert!(path.is_file(), "missing {}", path.display());
        }

        let leftovers: Vec<_> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".fepmerge-"))
            .collect();
        assert!(leftovers.is_empty());

        let log = fs::read_to_string(&files.mapping).unwrap();
        assert!(!log.contains("dummy"));
        let reread = read_mapping_log(BufReader::new(File::open(&files.mapping).unwrap())).unwrap();
        assert_eq!(reread, result.mapping.mapping);
    }
}
