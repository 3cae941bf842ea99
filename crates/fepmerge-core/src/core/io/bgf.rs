use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::system::{MolecularSystem, MolecularSystemBuilder};
use crate::core::models::topology::BondOrder;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BgfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: BgfParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum BgfParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 80 chars)")]
    LineTooShort,
    #[error("Cannot determine element from type '{ff_type}' or name '{name}'")]
    UnknownElement { ff_type: String, name: String },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_int<T: std::str::FromStr>(value: &str, columns: &str, line: usize) -> Result<T, BgfError> {
    value.parse().map_err(|_| BgfError::Parse {
        line,
        kind: BgfParseErrorKind::InvalidInt {
            columns: columns.into(),
            value: value.into(),
        },
    })
}

fn parse_float(value: &str, columns: &str, line: usize) -> Result<f64, BgfError> {
    value.parse().map_err(|_| BgfError::Parse {
        line,
        kind: BgfParseErrorKind::InvalidFloat {
            columns: columns.into(),
            value: value.into(),
        },
    })
}

/// The BIOGRF fixed-column format, with `CONECT`/`ORDER` connectivity.
pub struct BgfFile;

impl MolecularFile for BgfFile {
    type Error = BgfError;

    fn read_from(reader: &mut impl BufRead) -> Result<MolecularSystem, Self::Error> {
        let mut builder = MolecularSystemBuilder::new();
        let mut conect: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut orders: HashMap<usize, Vec<String>> = HashMap::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let record_type = slice_and_trim(&line, 0, 6);
            match record_type {
                "ATOM" | "HETATM" => {
                    if line.len() < 80 {
                        return Err(BgfError::Parse {
                            line: line_num,
                            kind: BgfParseErrorKind::LineTooShort,
                        });
                    }

                    let name = slice_and_trim(&line, 13, 18);
                    let ff_type = slice_and_trim(&line, 61, 66);
                    if name.is_empty() {
                        return Err(BgfError::Parse {
                            line: line_num,
                            kind: BgfParseErrorKind::MissingRequiredField {
                                columns: "14-18".into(),
                            },
                        });
                    }
                    if ff_type.is_empty() {
                        return Err(BgfError::Parse {
                            line: line_num,
                            kind: BgfParseErrorKind::MissingRequiredField {
                                columns: "62-66".into(),
                            },
                        });
                    }

                    let serial: usize = parse_int(slice_and_trim(&line, 7, 12), "8-12", line_num)?;
                    let res_name = slice_and_trim(&line, 19, 22);
                    let res_id: isize = parse_int(slice_and_trim(&line, 25, 30), "26-30", line_num)?;
                    let x = parse_float(slice_and_trim(&line, 30, 40), "31-40", line_num)?;
                    let y = parse_float(slice_and_trim(&line, 40, 50), "41-50", line_num)?;
                    let z = parse_float(slice_and_trim(&line, 50, 60), "51-60", line_num)?;
                    let charge = parse_float(slice_and_trim(&line, 72, 80), "73-80", line_num)?;

                    let element = Element::infer(ff_type, name).ok_or_else(|| BgfError::Parse {
                        line: line_num,
                        kind: BgfParseErrorKind::UnknownElement {
                            ff_type: ff_type.into(),
                            name: name.into(),
                        },
                    })?;

                    let atom = Atom::new(name, element, Point3::new(x, y, z))
                        .with_type(ff_type)
                        .with_charge(charge)
                        .with_residue(res_name, res_id);
                    builder.add_atom(serial, atom).ok_or_else(|| {
                        BgfError::Inconsistency(format!("Duplicate atom serial: {}", serial))
                    })?;
                }
                "CONECT" => {
                    let serials = line
                        .split_whitespace()
                        .skip(1)
                        .map(|s| parse_int::<usize>(s, "CONECT", line_num))
                        .collect::<Result<Vec<_>, _>>()?;
                    if let Some((&origin, partners)) = serials.split_first() {
                        conect.entry(origin).or_default().extend_from_slice(partners);
                    }
                }
                "ORDER" => {
                    let mut parts = line.split_whitespace().skip(1);
                    if let Some(origin) = parts.next() {
                        let origin: usize = parse_int(origin, "ORDER", line_num)?;
                        orders
                            .entry(origin)
                            .or_default()
                            .extend(parts.map(str::to_string));
                    }
                }
                "END" => break,
                _ => {}
            }
        }

        if builder.atom_count() == 0 {
            return Err(BgfError::MissingRecord("ATOM/HETATM records".into()));
        }

        let mut bonds: BTreeMap<(usize, usize), BondOrder> = BTreeMap::new();
        for (origin, partners) in &conect {
            let origin_orders = orders.get(origin);
            for (k, &partner) in partners.iter().enumerate() {
                let order = match origin_orders.and_then(|o| o.get(k)) {
                    Some(token) => token.parse::<BondOrder>().map_err(|_| {
                        BgfError::Inconsistency(format!(
                            "Invalid bond order '{}' for atom serial {}",
                            token, origin
                        ))
                    })?,
                    None => BondOrder::Single,
                };
                let key = (*origin.min(&partner), *origin.max(&partner));
                // Keep a non-single order when the two ends disagree.
                let entry = bonds.entry(key).or_insert(order);
                if *entry == BondOrder::Single {
                    *entry = order;
                }
            }
        }

        for ((a1, a2), order) in bonds {
            builder.add_bond(a1, a2, order).ok_or_else(|| {
                BgfError::Inconsistency(format!(
                    "Bond between unknown atom serials {} and {}",
                    a1, a2
                ))
            })?;
        }

        Ok(builder.build())
    }

    fn write_to(system: &MolecularSystem, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, "BIOGRF 200")?;
        writeln!(writer, "REMARK Generated by fepmerge")?;
        writeln!(
            writer,
            "FORMAT ATOM   (a6,1x,i5,1x,a5,1x,a3,1x,a1,1x,a5,3f10.5,1x,a5,i3,i2,1x,f8.5)"
        )?;

        let mut offsets = Vec::with_capacity(system.len());
        let mut offset = 0usize;
        for molecule in system.molecules() {
            offsets.push(offset);
            for (index, atom) in molecule.atoms().iter().enumerate() {
                writeln!(
                    writer,
                    "{:<6} {:>5} {:<5} {:>3} {:1} {:>5}{:>10.5}{:>10.5}{:>10.5} {:<5}{:>3}{:>2} {:>8.5}",
                    "HETATM",
                    offset + index + 1,
                    atom.name,
                    atom.residue_name,
                    "X",
                    atom.residue_number,
                    atom.position.x,
                    atom.position.y,
                    atom.position.z,
                    atom.force_field_type,
                    molecule.neighbors(index).len(),
                    0,
                    atom.partial_charge
                )?;
            }
            offset += molecule.len();
        }

        writeln!(writer, "FORMAT CONECT (a6,12i6)")?;
        for (molecule, &offset) in system.molecules().iter().zip(&offsets) {
            for index in 0..molecule.len() {
                let neighbors = molecule.neighbors(index);
                if neighbors.is_empty() {
                    continue;
                }
                let own = offset + index + 1;
                write!(writer, "CONECT{:>6}", own)?;
                for &n in neighbors {
                    write!(writer, "{:>6}", offset + n + 1)?;
                }
                writeln!(writer)?;

                let bond_orders: Vec<BondOrder> = neighbors
                    .iter()
                    .filter_map(|&n| molecule.bond_between(index, n).map(|b| b.order))
                    .collect();
                if bond_orders.iter().any(|&o| o != BondOrder::Single) {
                    write!(writer, "ORDER {:>6}", own)?;
                    for order in bond_orders {
                        write!(writer, "{:>6}", order as u8)?;
                    }
                    writeln!(writer)?;
                }
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}
