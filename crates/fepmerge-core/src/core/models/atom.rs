use super::element::Element;
use nalgebra::Point3;

/// Represents a single atom of a molecule.
///
/// Atoms are addressed by their position inside the owning [`Molecule`](super::molecule::Molecule);
/// that index is what atom mappings refer to, so the order atoms are added in
/// is significant and is preserved by every reader and writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "C1", "H12").
    pub name: String,
    /// The chemical element.
    pub element: Element,
    /// The force field atom type (e.g., "C_3", "ca"). Empty if unknown.
    pub force_field_type: String,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Name of the residue the atom belongs to (e.g., "LIG").
    pub residue_name: String,
    /// Residue sequence number from the source file.
    pub residue_number: isize,
}

impl Atom {
    /// Creates a new `Atom` in a default `LIG 1` residue with no type or charge.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `element` - The chemical element.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, element: Element, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element,
            force_field_type: String::new(),
            partial_charge: 0.0,
            position,
            residue_name: "LIG".to_string(),
            residue_number: 1,
        }
    }

    pub fn with_type(mut self, force_field_type: &str) -> Self {
        self.force_field_type = force_field_type.to_string();
        self
    }

    pub fn with_charge(mut self, partial_charge: f64) -> Self {
        self.partial_charge = partial_charge;
        self
    }

    pub fn with_residue(mut self, residue_name: &str, residue_number: isize) -> Self {
        self.residue_name = residue_name.to_string();
        self.residue_number = residue_number;
        self
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.is_hydrogen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new("C1", Element::C, Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.name, "C1");
        assert_eq!(atom.element, Element::C);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.force_field_type, "");
        assert_eq!(atom.partial_charge, 0.0);
        assert_eq!(atom.residue_name, "LIG");
        assert_eq!(atom.residue_number, 1);
    }

    #[test]
    fn builder_methods_set_optional_fields() {
        let atom = Atom::new("O1", Element::O, Point3::origin())
            .with_type("O_2")
            .with_charge(-0.5)
            .with_residue("MOL", 7);

        assert_eq!(atom.force_field_type, "O_2");
        assert_eq!(atom.partial_charge, -0.5);
        assert_eq!(atom.residue_name, "MOL");
        assert_eq!(atom.residue_number, 7);
    }

    #[test]
    fn hydrogen_check_uses_element() {
        assert!(Atom::new("HX", Element::H, Point3::origin()).is_hydrogen());
        assert!(!Atom::new("H", Element::C, Point3::origin()).is_hydrogen());
    }
}
