use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::system::{MolecularSystem, MolecularSystemBuilder};
use crate::core::models::topology::BondOrder;
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Mol2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {details}")]
    Parse { line: usize, details: String },
    #[error("Missing required section: {0}")]
    MissingSection(&'static str),
}

impl Mol2Error {
    fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Molecule,
    Atom,
    Bond,
    Other,
}

/// The Tripos MOL2 format.
///
/// Every `@<TRIPOS>MOLECULE` block in the file is read; atom ids are local
/// to their block.
pub struct Mol2File;

impl MolecularFile for Mol2File {
    type Error = Mol2Error;

    fn read_from(reader: &mut impl BufRead) -> Result<MolecularSystem, Self::Error> {
        let mut builder = MolecularSystemBuilder::new();
        let mut section = Section::Other;
        let mut seen_molecule = false;
        let mut block_ids: HashMap<usize, usize> = HashMap::new();
        let mut next_serial = 1usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some(tag) = trimmed.strip_prefix("@<TRIPOS>") {
                section = match tag.to_ascii_uppercase().as_str() {
                    "MOLECULE" => {
                        seen_molecule = true;
                        block_ids.clear();
                        Section::Molecule
                    }
                    "ATOM" => Section::Atom,
                    "BOND" => Section::Bond,
                    _ => Section::Other,
                };
                continue;
            }

            match section {
                Section::Atom => {
                    let parts: Vec<&str> = trimmed.split_whitespace().collect();
                    if parts.len() < 6 {
                        return Err(Mol2Error::parse(line_num, "invalid ATOM line"));
                    }
                    let id: usize = parts[0]
                        .parse()
                        .map_err(|_| Mol2Error::parse(line_num, "invalid atom id"))?;
                    let mut coords = [0.0f64; 3];
                    for (k, value) in parts[2..5].iter().enumerate() {
                        coords[k] = value
                            .parse()
                            .map_err(|_| Mol2Error::parse(line_num, "invalid coordinate"))?;
                    }
                    let name = parts[1];
                    let atom_type = parts[5];
                    let element = Element::infer(atom_type, name)
                        .ok_or_else(|| Mol2Error::parse(line_num, "unable to infer element"))?;

                    let residue_number = match parts.get(6) {
                        Some(v) => v
                            .parse()
                            .map_err(|_| Mol2Error::parse(line_num, "invalid substructure id"))?,
                        None => 1,
                    };
                    let residue_name = parts.get(7).copied().unwrap_or("LIG");
                    let charge = match parts.get(8) {
                        Some(v) => v
                            .parse()
                            .map_err(|_| Mol2Error::parse(line_num, "invalid charge"))?,
                        None => 0.0,
                    };

                    let atom = Atom::new(name, element, Point3::new(coords[0], coords[1], coords[2]))
                        .with_type(atom_type)
                        .with_charge(charge)
                        .with_residue(residue_name, residue_number);
                    if block_ids.insert(id, next_serial).is_some() {
                        return Err(Mol2Error::parse(line_num, "duplicate atom id"));
                    }
                    builder
                        .add_atom(next_serial, atom)
                        .ok_or_else(|| Mol2Error::parse(line_num, "duplicate atom id"))?;
                    next_serial += 1;
                }
                Section::Bond => {
                    let parts: Vec<&str> = trimmed.split_whitespace().collect();
                    if parts.len() < 4 {
                        return Err(Mol2Error::parse(line_num, "invalid BOND line"));
                    }
                    let mut ends = [0usize; 2];
                    for (k, value) in parts[1..3].iter().enumerate() {
                        let id: usize = value
                            .parse()
                            .map_err(|_| Mol2Error::parse(line_num, "invalid atom id in BOND line"))?;
                        ends[k] = *block_ids.get(&id).ok_or_else(|| {
                            Mol2Error::parse(line_num, "bond references unknown atom id")
                        })?;
                    }
                    // Amide bonds are stored as single bonds.
                    let order = match parts[3].to_ascii_lowercase().as_str() {
                        "am" => BondOrder::Single,
                        other => other.parse().map_err(|_| {
                            Mol2Error::parse(line_num, "unsupported bond type in BOND line")
                        })?,
                    };
                    builder
                        .add_bond(ends[0], ends[1], order)
                        .ok_or_else(|| Mol2Error::parse(line_num, "bond references unknown atom"))?;
                }
                Section::Molecule | Section::Other => {}
            }
        }

        if !seen_molecule {
            return Err(Mol2Error::MissingSection("@<TRIPOS>MOLECULE"));
        }
        if builder.atom_count() == 0 {
            return Err(Mol2Error::MissingSection("@<TRIPOS>ATOM"));
        }
        Ok(builder.build())
    }

    fn write_to(system: &MolecularSystem, writer: &mut impl Write) -> Result<(), Self::Error> {
        let bond_count: usize = system.molecules().iter().map(|m| m.bonds().len()).sum();
        let name = system.molecule(0).map_or("SYSTEM", |m| m.name.as_str());

        writeln!(writer, "@<TRIPOS>MOLECULE")?;
        writeln!(writer, "{}", name)?;
        writeln!(
            writer,
            "{:>5} {:>5} {:>5} 0 0",
            system.atom_count(),
            bond_count,
            system.len()
        )?;
        writeln!(writer, "SMALL")?;
        writeln!(writer, "USER_CHARGES")?;
        writeln!(writer)?;

        writeln!(writer, "@<TRIPOS>ATOM")?;
        let mut offset = 0usize;
        for molecule in system.molecules() {
            for (index, atom) in molecule.atoms().iter().enumerate() {
                let atom_type = if atom.force_field_type.is_empty() {
                    atom.element.symbol()
                } else {
                    atom.force_field_type.as_str()
                };
                writeln!(
                    writer,
                    "{:>7} {:<8} {:>10.4} {:>10.4} {:>10.4} {:<6} {:>3} {:<8} {:>9.4}",
                    offset + index + 1,
                    atom.name,
                    atom.position.x,
                    atom.position.y,
                    atom.position.z,
                    atom_type,
                    atom.residue_number,
                    atom.residue_name,
                    atom.partial_charge
                )?;
            }
            offset += molecule.len();
        }

        writeln!(writer, "@<TRIPOS>BOND")?;
        let mut offset = 0usize;
        let mut bond_id = 0usize;
        for molecule in system.molecules() {
            for bond in molecule.bonds() {
                bond_id += 1;
                writeln!(
                    writer,
                    "{:>6} {:>5} {:>5} {}",
                    bond_id,
                    offset + bond.atom1 + 1,
                    offset + bond.atom2 + 1,
                    bond.order.to_mol2()
                )?;
            }
            offset += molecule.len();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const METHANOL: &str = "\
@<TRIPOS>MOLECULE
MOL
 6 5 1 0 0
SMALL
USER_CHARGES

@<TRIPOS>ATOM
      1 C1          0.0000    0.0000    0.0000 c3        1 MOL      0.1167
      2 O1          1.4100    0.0000    0.0000 oh        1 MOL     -0.5988
      3 H1         -0.3600    1.0300    0.0000 h1        1 MOL      0.0287
      4 H2         -0.3600   -0.5100    0.8900 h1        1 MOL      0.0287
      5 H3         -0.3600   -0.5100   -0.8900 h1        1 MOL      0.0287
      6 H4          1.7300    0.9300    0.0000 ho        1 MOL      0.3960
@<TRIPOS>BOND
     1     1     2 1
     2     1     3 1
     3     1     4 1
     4     1     5 1
     5     2     6 1
";

    fn read(text: &str) -> Result<MolecularSystem, Mol2Error> {
        Mol2File::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn reads_gaff_typed_molecule() {
        let system = read(METHANOL).unwrap();
        assert_eq!(system.len(), 1);

        let mol = system.molecule(0).unwrap();
        assert_eq!(mol.name, "MOL");
        assert_eq!(mol.len(), 6);
        assert_eq!(mol.bonds().len(), 5);
        assert_eq!(mol.atom(0).unwrap().element, Element::C);
        assert_eq!(mol.atom(1).unwrap().element, Element::O);
        assert_eq!(mol.atom(5).unwrap().force_field_type, "ho");
        assert!(mol.atoms().iter().map(|a| a.partial_charge).sum::<f64>().abs() < 1e-3);
        assert!(mol.are_bonded(1, 5));
    }

    #[test]
    fn sybyl_types_and_aromatic_bonds_are_understood() {
        let text = "\
@<TRIPOS>MOLECULE
X
2 1
SMALL
NO_CHARGES
@<TRIPOS>ATOM
1 CA 0.0 0.0 0.0 C.ar
2 CL 1.7 0.0 0.0 Cl
@<TRIPOS>BOND
1 1 2 ar
";
        let system = read(text).unwrap();
        let mol = system.molecule(0).unwrap();
        assert_eq!(mol.atom(0).unwrap().element, Element::C);
        assert_eq!(mol.atom(1).unwrap().element, Element::Cl);
        assert_eq!(mol.bonds()[0].order, BondOrder::Aromatic);
        assert_eq!(mol.atom(0).unwrap().residue_name, "LIG");
    }

    #[test]
    fn write_then_read_preserves_atoms_and_charges() {
        let system = read(METHANOL).unwrap();
        let mut buffer = Vec::new();
        Mol2File::write_to(&system, &mut buffer).unwrap();

        let reread = read(&String::from_utf8(buffer).unwrap()).unwrap();
        let mol = reread.molecule(0).unwrap();
        assert_eq!(mol.len(), 6);
        assert_eq!(mol.bonds().len(), 5);
        assert_eq!(mol.atom(1).unwrap().name, "O1");
        assert!((mol.atom(1).unwrap().partial_charge + 0.5988).abs() < 1e-9);
    }

    #[test]
    fn missing_molecule_section_is_an_error() {
        assert!(matches!(
            read("@<TRIPOS>ATOM\n1 C1 0 0 0 C.3\n"),
            Err(Mol2Error::MissingSection("@<TRIPOS>MOLECULE"))
        ));
    }

    #[test]
    fn bond_to_unknown_atom_is_an_error() {
        let text = "@<TRIPOS>MOLECULE\nX\n1 1\n@<TRIPOS>ATOM\n1 C1 0 0 0 C.3\n@<TRIPOS>BOND\n1 1 7 1\n";
        assert!(matches!(read(text), Err(Mol2Error::Parse { line: 7, .. })));
    }
}
