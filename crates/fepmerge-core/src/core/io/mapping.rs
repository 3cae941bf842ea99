//! Text formats for atom mappings.
//!
//! - CSV mapping files: `idxA,idxB` per line, `#` comments, 0-based indices.
//! - Prematch strings: `"1-3,4-8"` style pair lists given on the command line.
//! - Mapping logs: a human-readable, line-per-atom listing of a mapping,
//!   with `dummy` standing in for atoms that have no counterpart.

use crate::core::models::mapping::{AtomMapping, MappingError};
use crate::core::models::molecule::Molecule;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Token used in mapping logs for an atom with no counterpart.
pub const DUMMY: &str = "dummy";

#[derive(Debug, Error)]
pub enum MappingFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed mapping record on line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("Expected 2 fields on mapping line {line}, found {found}")]
    FieldCount { line: u64, found: usize },
    #[error("Invalid mapping: {0}")]
    Invalid(#[from] MappingError),
    #[error("Malformed mapping log on line {line}: {details}")]
    Log { line: usize, details: String },
    #[error("Atom index {index} is out of range for molecule '{molecule}' ({len} atoms)")]
    OutOfRange {
        index: usize,
        molecule: String,
        len: usize,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrematchError {
    #[error("Invalid prematch pair '{0}': expected 'idxA-idxB'")]
    MalformedPair(String),
    #[error("Invalid prematch: {0}")]
    Invalid(#[from] MappingError),
}

/// Reads a CSV mapping, preserving the order of the data lines.
///
/// Lines that are empty after trimming are skipped. Every other line must
/// hold exactly two indices.
pub fn read_csv_mapping(reader: impl Read) -> Result<AtomMapping, MappingFileError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut mapping = AtomMapping::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| MappingFileError::Csv {
            line: e.position().map_or(0, |p| p.line()),
            source: e,
        })?;
        let line = record.position().map_or(0, |p| p.line());
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != 2 {
            return Err(MappingFileError::FieldCount {
                line,
                found: record.len(),
            });
        }
        let (source, target) = record
            .deserialize::<(usize, usize)>(None)
            .map_err(|e| MappingFileError::Csv { line, source: e })?;
        mapping.insert(source, target)?;
    }
    Ok(mapping)
}

pub fn read_csv_mapping_from_path(path: impl AsRef<Path>) -> Result<AtomMapping, MappingFileError> {
    let file = File::open(path)?;
    read_csv_mapping(BufReader::new(file))
}

/// Writes a mapping in the format accepted by [`read_csv_mapping`].
pub fn write_csv_mapping(mapping: &AtomMapping, writer: impl Write) -> Result<(), MappingFileError> {
    let mut writer = writer;
    writeln!(writer, "# idxA,idxB (0-based atom indices)")?;
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for pair in mapping.pairs() {
        csv_writer.serialize(pair).map_err(|e| MappingFileError::Csv {
            line: 0,
            source: e,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Parses a prematch string such as `"1-3,4-8"`.
///
/// Whitespace around indices is ignored and an empty string gives an empty
/// mapping.
pub fn parse_prematch(text: &str) -> Result<AtomMapping, PrematchError> {
    let mut mapping = AtomMapping::new();
    for pair in text.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (source, target) = pair
            .split_once('-')
            .ok_or_else(|| PrematchError::MalformedPair(pair.to_string()))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| PrematchError::MalformedPair(pair.to_string()))
        };
        mapping.insert(parse(source)?, parse(target)?)?;
    }
    Ok(mapping)
}

fn atom_name(molecule: &Molecule, index: usize) -> Result<&str, MappingFileError> {
    molecule
        .atom(index)
        .map(|a| a.name.as_str())
        .ok_or_else(|| MappingFileError::OutOfRange {
            index,
            molecule: molecule.name.clone(),
            len: molecule.len(),
        })
}

/// Writes the human-readable mapping log.
///
/// Every atom of `a` gets one line in atom order, showing its partner in `b`
/// or `dummy`; the atoms of `b` without a partner follow, in their order.
pub fn write_mapping_log(
    a: &Molecule,
    b: &Molecule,
    mapping: &AtomMapping,
    writer: &mut impl Write,
) -> Result<(), MappingFileError> {
    writeln!(writer, "# Atom mapping between lambda=0 and lambda=1")?;
    writeln!(
        writer,
        "# lambda=0: {} ({} atoms), lambda=1: {} ({} atoms), {} mapped",
        a.name,
        a.len(),
        b.name,
        b.len(),
        mapping.len()
    )?;

    for (i, atom) in a.atoms().iter().enumerate() {
        match mapping.get(i) {
            Some(j) => writeln!(
                writer,
                "{:>6} {:<6} -> {:>6} {}",
                i,
                atom.name,
                j,
                atom_name(b, j)?
            )?,
            None => writeln!(writer, "{:>6} {:<6} -> {}", i, atom.name, DUMMY)?,
        }
    }
    for (j, atom) in b.atoms().iter().enumerate() {
        if !mapping.contains_target(j) {
            writeln!(writer, "{:>13} -> {:>6} {}", DUMMY, j, atom.name)?;
        }
    }
    Ok(())
}

/// Reads a mapping log back into a mapping; `dummy` lines are skipped.
pub fn read_mapping_log(reader: impl BufRead) -> Result<AtomMapping, MappingFileError> {
    let mut mapping = AtomMapping::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = line_num + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (left, right) = trimmed.split_once("->").ok_or_else(|| MappingFileError::Log {
            line: line_num,
            details: "missing '->'".to_string(),
        })?;
        let (left, right) = (left.trim(), right.trim());
        if left == DUMMY || right == DUMMY {
            continue;
        }

        let index = |side: &str| -> Result<usize, MappingFileError> {
            side.split_whitespace()
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| MappingFileError::Log {
                    line: line_num,
                    details: format!("expected an atom index in '{}'", side),
                })
        };
        mapping.insert(index(left)?, index(right)?)?;
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use nalgebra::Point3;
    use std::io::Cursor;

    fn molecule(name: &str, atoms: &[&str]) -> Molecule {
        let mut mol = Molecule::new(name);
        for atom in atoms {
            mol.add_atom(Atom::new(atom, Element::C, Point3::origin()));
        }
        mol
    }

    #[test]
    fn csv_skips_comments_and_blank_lines_in_order() {
        let text = "# header\n4,8\n\n# middle comment\n 1 , 3 \n2,2\n";
        let mapping = read_csv_mapping(text.as_bytes()).unwrap();
        assert_eq!(mapping.pairs(), &[(4, 8), (1, 3), (2, 2)]);
    }

    #[test]
    fn csv_rejects_malformed_records() {
        let err = read_csv_mapping("0,1\nx,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MappingFileError::Csv { line: 2, .. }));

        let err = read_csv_mapping("0,1\n3\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            MappingFileError::FieldCount { line: 2, found: 1 }
        ));
    }

    #[test]
    fn csv_rejects_extra_fields() {
        let err = read_csv_mapping("0,1,9\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            MappingFileError::FieldCount { line: 1, found: 3 }
        ));
    }

    #[test]
    fn csv_skips_whitespace_only_lines() {
        let mapping = read_csv_mapping("0,1\n   \n2,3\n\t\n".as_bytes()).unwrap();
        assert_eq!(mapping.pairs(), &[(0, 1), (2, 3)]);
    }

    #[test]
    fn csv_rejects_duplicate_indices() {
        let err = read_csv_mapping("0,1\n0,2\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            MappingFileError::Invalid(MappingError::DuplicateSource(0))
        ));
    }

    #[test]
    fn csv_written_mapping_reads_back() {
        let mapping = AtomMapping::from_pairs([(3, 0), (0, 5), (1, 1)]).unwrap();
        let mut buffer = Vec::new();
        write_csv_mapping(&mapping, &mut buffer).unwrap();
        let reread = read_csv_mapping(buffer.as_slice()).unwrap();
        assert_eq!(reread, mapping);
    }

    #[test]
    fn csv_mapping_reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.csv");
        std::fs::write(&path, "# a,b\n0,0\n1,2\n").unwrap();
        let mapping = read_csv_mapping_from_path(&path).unwrap();
        assert_eq!(mapping.pairs(), &[(0, 0), (1, 2)]);
        assert!(matches!(
            read_csv_mapping_from_path(dir.path().join("missing.csv")),
            Err(MappingFileError::Io(_))
        ));
    }

    #[test]
    fn prematch_parses_pairs() {
        let mapping = parse_prematch("1-3,4-8").unwrap();
        assert_eq!(mapping.pairs(), &[(1, 3), (4, 8)]);
        assert_eq!(mapping.get(4), Some(8));

        let spaced = parse_prematch(" 1 - 3 , 4-8 ").unwrap();
        assert_eq!(spaced, mapping);
        assert!(parse_prematch("").unwrap().is_empty());
    }

    #[test]
    fn prematch_rejects_bad_pairs() {
        assert_eq!(
            parse_prematch("1-3,4"),
            Err(PrematchError::MalformedPair("4".to_string()))
        );
        assert_eq!(
            parse_prematch("a-3"),
            Err(PrematchError::MalformedPair("a-3".to_string()))
        );
        assert_eq!(
            parse_prematch("1-3,1-4"),
            Err(PrematchError::Invalid(MappingError::DuplicateSource(1)))
        );
    }

    #[test]
    fn mapping_log_round_trip() {
        let a = molecule("LIG", &["C1", "C2", "O1", "H1"]);
        let b = molecule("LIG", &["C1", "N1", "C2", "H1", "H2"]);
        let mapping = AtomMapping::from_pairs([(0, 0), (1, 2), (3, 4)]).unwrap();

        let mut buffer = Vec::new();
        write_mapping_log(&a, &b, &mapping, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let body: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(body.len(), 6);
        assert_eq!(body[0], "     0 C1     ->      0 C1");
        assert_eq!(body[2], "     2 O1     -> dummy");
        assert_eq!(body[4], "        dummy ->      1 N1");
        assert_eq!(text.matches(DUMMY).count(), 3);

        let reread = read_mapping_log(Cursor::new(text)).unwrap();
        assert_eq!(reread, mapping);
    }

    #[test]
    fn mapping_log_rejects_out_of_range_partner() {
        let a = molecule("A", &["C1"]);
        let b = molecule("B", &["C1"]);
        let mapping = AtomMapping::from_pairs([(0, 3)]).unwrap();
        let err = write_mapping_log(&a, &b, &mapping, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, MappingFileError::OutOfRange { index: 3, .. }));
    }

    #[test]
    fn malformed_log_line_is_reported() {
        let err = read_mapping_log(Cursor::new("# header\n 0 C1 => 1 C2\n")).unwrap_err();
        assert!(matches!(err, MappingFileError::Log { line: 2, .. }));
    }
}
