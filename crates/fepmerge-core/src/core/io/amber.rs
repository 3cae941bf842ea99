//! Writers for AMBER `prm7` topologies and `rst7` coordinate files.
//!
//! The topology carries what the models know about: names, charges, masses,
//! atom types, residues and bonds. No force-field parameters are assigned, so
//! parameter counts are zero and bond type indices are left at zero.

use crate::core::models::system::MolecularSystem;
use std::collections::HashMap;
use std::io::{self, Write};

/// Converts charges in units of e to the internal AMBER charge unit.
const AMBER_CHARGE_FACTOR: f64 = 18.2223;

/// Formats a value the way Fortran's `1PE16.8` edit descriptor does.
fn fortran_e16_8(value: f64) -> String {
    let formatted = format!("{:.8E}", value);
    let (mantissa, exponent) = formatted.split_once('E').unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{:>16}", format!("{}E{}{:02}", mantissa, sign, exponent.abs()))
}

fn write_section<T>(
    writer: &mut impl Write,
    flag: &str,
    format: &str,
    per_line: usize,
    items: &[T],
    render: impl Fn(&T) -> String,
) -> io::Result<()> {
    writeln!(writer, "%FLAG {}", flag)?;
    writeln!(writer, "%FORMAT({})", format)?;
    if items.is_empty() {
        writeln!(writer)?;
        return Ok(());
    }
    for chunk in items.chunks(per_line) {
        let line: String = chunk.iter().map(&render).collect();
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

fn a4(text: &str) -> String {
    format!("{:<4.4}", text)
}

fn int8(value: &usize) -> String {
    format!("{:>8}", value)
}

struct Residue {
    label: String,
    first_atom: usize,
    size: usize,
}

fn residues(system: &MolecularSystem) -> Vec<Residue> {
    let mut residues: Vec<Residue> = Vec::new();
    let mut offset = 0usize;
    for molecule in system.molecules() {
        let mut current: Option<(&str, isize)> = None;
        for (index, atom) in molecule.atoms().iter().enumerate() {
            let key = (atom.residue_name.as_str(), atom.residue_number);
            if current == Some(key) {
                if let Some(last) = residues.last_mut() {
                    last.size += 1;
                }
            } else {
                residues.push(Residue {
                    label: atom.residue_name.clone(),
                    first_atom: offset + index + 1,
                    size: 1,
                });
                current = Some(key);
            }
        }
        offset += molecule.len();
    }
    residues
}

/// Writes an AMBER parameter/topology file for the system.
pub fn write_prm7(system: &MolecularSystem, writer: &mut impl Write) -> io::Result<()> {
    let atoms: Vec<_> = system.atoms().collect();
    let residues = residues(system);

    let type_names: Vec<String> = atoms
        .iter()
        .map(|a| {
            if a.force_field_type.is_empty() {
                a.element.symbol().to_string()
            } else {
                a.force_field_type.clone()
            }
        })
        .collect();
    let mut type_index: HashMap<&str, usize> = HashMap::new();
    let atom_type_indices: Vec<usize> = type_names
        .iter()
        .map(|t| {
            let next = type_index.len() + 1;
            *type_index.entry(t.as_str()).or_insert(next)
        })
        .collect();

    let mut bonds_with_h: Vec<usize> = Vec::new();
    let mut bonds_without_h: Vec<usize> = Vec::new();
    let mut offset = 0usize;
    for molecule in system.molecules() {
        for bond in molecule.bonds() {
            let involves_h = molecule.atom(bond.atom1).is_some_and(|a| a.is_hydrogen())
                || molecule.atom(bond.atom2).is_some_and(|a| a.is_hydrogen());
            let target = if involves_h {
                &mut bonds_with_h
            } else {
                &mut bonds_without_h
            };
            target.extend([3 * (offset + bond.atom1), 3 * (offset + bond.atom2), 0]);
        }
        offset += molecule.len();
    }

    let natom = atoms.len();
    let ntypes = type_index.len();
    let nbonh = bonds_with_h.len() / 3;
    let mbona = bonds_without_h.len() / 3;
    let nres = residues.len();
    let nmxrs = residues.iter().map(|r| r.size).max().unwrap_or(0);
    let pointers: [usize; 31] = [
        natom, ntypes, nbonh, mbona, 0, 0, 0, 0, 0, 0, 0, nres, mbona, 0, 0, 0, 0, 0, ntypes, 0, 0,
        0, 0, 0, 0, 0, 0, 0, nmxrs, 0, 0,
    ];

    writeln!(writer, "%VERSION  VERSION_STAMP = V0001.000")?;
    let title = system.molecule(0).map_or("SYSTEM", |m| m.name.as_str());
    write_section(writer, "TITLE", "20a4", 1, &[title], |t| t.to_string())?;
    write_section(writer, "POINTERS", "10I8", 10, &pointers, int8)?;
    write_section(writer, "ATOM_NAME", "20a4", 20, &atoms, |a| a4(&a.name))?;
    write_section(writer, "CHARGE", "5E16.8", 5, &atoms, |a| {
        fortran_e16_8(a.partial_charge * AMBER_CHARGE_FACTOR)
    })?;
    write_section(writer, "ATOMIC_NUMBER", "10I8", 10, &atoms, |a| {
        int8(&(a.element.atomic_number() as usize))
    })?;
    write_section(writer, "MASS", "5E16.8", 5, &atoms, |a| {
        fortran_e16_8(a.element.mass())
    })?;
    write_section(writer, "ATOM_TYPE_INDEX", "10I8", 10, &atom_type_indices, int8)?;
    write_section(writer, "RESIDUE_LABEL", "20a4", 20, &residues, |r| a4(&r.label))?;
    write_section(writer, "RESIDUE_POINTER", "10I8", 10, &residues, |r| {
        int8(&r.first_atom)
    })?;
    write_section(writer, "AMBER_ATOM_TYPE", "20a4", 20, &type_names, |t| a4(t))?;
    write_section(writer, "BONDS_INC_HYDROGEN", "10I8", 10, &bonds_with_h, int8)?;
    write_section(writer, "BONDS_WITHOUT_HYDROGEN", "10I8", 10, &bonds_without_h, int8)?;
    Ok(())
}

/// Writes an AMBER restart (coordinate) file for the system.
pub fn write_rst7(system: &MolecularSystem, writer: &mut impl Write) -> io::Result<()> {
    let title = system.molecule(0).map_or("SYSTEM", |m| m.name.as_str());
    writeln!(writer, "{}", title)?;
    writeln!(writer, "{:>6}", system.atom_count())?;

    let coords: Vec<f64> = system
        .atoms()
        .flat_map(|a| [a.position.x, a.position.y, a.position.z])
        .collect();
    for chunk in coords.chunks(6) {
        let line: String = chunk.iter().map(|c| format!("{:>12.7}", c)).collect();
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::topology::BondOrder;
    use nalgebra::Point3;

    fn methane_and_ion() -> MolecularSystem {
        let mut mol = Molecule::new("MET");
        let c = mol.add_atom(
            Atom::new("C1", Element::C, Point3::new(0.0, 0.0, 0.0))
                .with_type("c3")
                .with_charge(-0.4)
                .with_residue("MET", 1),
        );
        for (k, x) in [1.0, -1.0].into_iter().enumerate() {
            let h = mol.add_atom(
                Atom::new(&format!("H{}", k + 1), Element::H, Point3::new(x, 0.5, 0.0))
                    .with_type("hc")
                    .with_charge(0.2)
                    .with_residue("MET", 1),
            );
            mol.add_bond(c, h, BondOrder::Single).unwrap();
        }
        let mut ion = Molecule::new("NA");
        ion.add_atom(
            Atom::new("NA", Element::Na, Point3::new(3.0, 3.0, 3.0))
                .with_type("Na+")
                .with_charge(1.0)
                .with_residue("NA", 2),
        );
        MolecularSystem::from_molecules(vec![mol, ion])
    }

    fn section<'a>(text: &'a str, flag: &str) -> Vec<&'a str> {
        let header = format!("%FLAG {}", flag);
        text.lines()
            .skip_while(|l| *l != header)
            .skip(2)
            .take_while(|l| !l.starts_with('%'))
            .collect()
    }

    #[test]
    fn fortran_exponent_format_matches_amber() {
        assert_eq!(fortran_e16_8(1.008), "  1.00800000E+00");
        assert_eq!(fortran_e16_8(-7.28892), " -7.28892000E+00");
        assert_eq!(fortran_e16_8(0.0), "  0.00000000E+00");
        assert_eq!(fortran_e16_8(12.011), "  1.20110000E+01");
        assert_eq!(fortran_e16_8(0.05), "  5.00000000E-02");
    }

    #[test]
    fn prm7_contains_counts_residues_and_bonds() {
        let mut buffer = Vec::new();
        write_prm7(&methane_and_ion(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let pointers = section(&text, "POINTERS");
        let first: Vec<usize> = pointers[0]
            .split_whitespace()
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(first[0], 4);
        assert_eq!(first[1], 3);
        assert_eq!(first[2], 2);
        assert_eq!(first[3], 0);

        assert_eq!(section(&text, "RESIDUE_LABEL"), vec!["MET NA  "]);
        assert_eq!(
            section(&text, "RESIDUE_POINTER"),
            vec!["       1       4"]
        );
        assert_eq!(
            section(&text, "BONDS_INC_HYDROGEN"),
            vec!["       0       3       0       0       6       0"]
        );
        assert_eq!(section(&text, "BONDS_WITHOUT_HYDROGEN"), vec![""]);
        assert_eq!(section(&text, "AMBER_ATOM_TYPE"), vec!["c3  hc  hc  Na+ "]);
    }

    #[test]
    fn rst7_lists_six_coordinates_per_line() {
        let mut buffer = Vec::new();
        write_rst7(&methane_and_ion(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "MET");
        assert_eq!(lines[1], "     4");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2].len(), 72);
        assert_eq!(&lines[2][..12], "   0.0000000");
        assert_eq!(lines[3], "  -1.0000000   0.5000000   0.0000000   3.0000000   3.0000000   3.0000000");
    }
}
