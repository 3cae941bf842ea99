use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::system::{MolecularSystem, MolecularSystemBuilder};
use crate::core::models::topology::BondOrder;
use nalgebra::Point3;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {details}")]
    Parse { line: usize, details: String },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_field<T: std::str::FromStr>(line: &str, start: usize, end: usize, line_num: usize) -> Result<T, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        details: format!("invalid value '{}' in columns {}-{}", value, start + 1, end),
    })
}

/// PDB atom names are left-justified in column 13 when they fill all four
/// characters or when the element symbol is two letters long; otherwise they
/// start in column 14.
fn format_atom_name(name: &str, element: Element) -> String {
    if name.len() >= 4 || element.symbol().len() == 2 {
        format!("{:<4}", name)
    } else {
        format!(" {:<3}", name)
    }
}

/// The Protein Data Bank format, restricted to coordinate and `CONECT` records.
///
/// Force-field types and charges are not representable and are dropped.
pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<MolecularSystem, Self::Error> {
        let mut builder = MolecularSystemBuilder::new();
        let mut bonds: BTreeSet<(usize, usize)> = BTreeSet::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            details: "coordinate record is shorter than 54 columns".into(),
                        });
                    }
                    let serial: usize = parse_field(&line, 6, 11, line_num)?;
                    let name = slice_and_trim(&line, 12, 16);
                    let residue_name = slice_and_trim(&line, 17, 20);
                    let residue_number: isize = parse_field(&line, 22, 26, line_num)?;
                    let x: f64 = parse_field(&line, 30, 38, line_num)?;
                    let y: f64 = parse_field(&line, 38, 46, line_num)?;
                    let z: f64 = parse_field(&line, 46, 54, line_num)?;

                    let symbol = slice_and_trim(&line, 76, 78);
                    let element = symbol
                        .parse::<Element>()
                        .ok()
                        .or_else(|| Element::guess(name))
                        .ok_or_else(|| PdbError::Parse {
                            line: line_num,
                            details: format!("unable to infer element of atom '{}'", name),
                        })?;

                    let atom = Atom::new(name, element, Point3::new(x, y, z))
                        .with_residue(residue_name, residue_number);
                    builder.add_atom(serial, atom).ok_or_else(|| PdbError::Parse {
                        line: line_num,
                        details: format!("duplicate atom serial {}", serial),
                    })?;
                }
                "CONECT" => {
                    let serials = line
                        .split_whitespace()
                        .skip(1)
                        .map(|s| {
                            s.parse::<usize>().map_err(|_| PdbError::Parse {
                                line: line_num,
                                details: format!("invalid serial '{}' in CONECT record", s),
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    if let Some((&origin, partners)) = serials.split_first() {
                        for &partner in partners {
                            if partner != origin {
                                bonds.insert((origin.min(partner), origin.max(partner)));
                            }
                        }
                    }
                }
                "END" | "ENDMDL" => break,
                _ => {}
            }
        }

        if builder.atom_count() == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        for (a1, a2) in bonds {
            builder.add_bond(a1, a2, BondOrder::Single).ok_or_else(|| {
                PdbError::MissingRecord(format!("atom for CONECT pair {}-{}", a1, a2))
            })?;
        }
        if builder.bond_count() == 0 && builder.atom_count() > 1 {
            warn!(
                atoms = builder.atom_count(),
                "PDB input has no CONECT records; grouping atoms into molecules by residue."
            );
            builder.group_by_residue();
        }
        Ok(builder.build())
    }

    fn write_to(system: &MolecularSystem, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, "REMARK   1 GENERATED BY FEPMERGE")?;

        let mut offset = 0usize;
        for molecule in system.molecules() {
            for (index, atom) in molecule.atoms().iter().enumerate() {
                let serial = (offset + index + 1) % 100_000;
                writeln!(
                    writer,
                    "HETATM{:>5} {}{:1}{:>3} {:1}{:>4}{:1}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                    serial,
                    format_atom_name(&atom.name, atom.element),
                    "",
                    atom.residue_name,
                    "A",
                    atom.residue_number % 10_000,
                    "",
                    atom.position.x,
                    atom.position.y,
                    atom.position.z,
                    1.0,
                    0.0,
                    atom.element.symbol().to_ascii_uppercase()
                )?;
            }
            offset += molecule.len();
            writeln!(writer, "TER")?;
        }

        let mut offset = 0usize;
        for molecule in system.molecules() {
            for index in 0..molecule.len() {
                let neighbors = molecule.neighbors(index);
                // CONECT holds at most four partners per record.
                for chunk in neighbors.chunks(4) {
                    write!(writer, "CONECT{:>5}", offset + index + 1)?;
                    for &n in chunk {
                        write!(writer, "{:>5}", offset + n + 1)?;
                    }
                    writeln!(writer)?;
                }
            }
            offset += molecule.len();
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}
