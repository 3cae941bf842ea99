use phf::phf_map;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chemical elements that occur in drug-like ligands and their counter-ions.
///
/// The discriminant of each variant is its atomic number, which lets the AMBER
/// topology writer emit `ATOMIC_NUMBER` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Element {
    H = 1,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Na = 11,
    Mg = 12,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    K = 19,
    Ca = 20,
    Fe = 26,
    Zn = 30,
    Se = 34,
    Br = 35,
    I = 53,
}

static SYMBOL_TABLE: phf::Map<&'static str, Element> = phf_map! {
    "H" => Element::H,
    "B" => Element::B,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "F" => Element::F,
    "NA" => Element::Na,
    "MG" => Element::Mg,
    "SI" => Element::Si,
    "P" => Element::P,
    "S" => Element::S,
    "CL" => Element::Cl,
    "K" => Element::K,
    "CA" => Element::Ca,
    "FE" => Element::Fe,
    "ZN" => Element::Zn,
    "SE" => Element::Se,
    "BR" => Element::Br,
    "I" => Element::I,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol: '{0}'")]
pub struct ParseElementError(pub String);

impl Element {
    pub fn symbol(self) -> &'static str {
        match self {
            Element::H => "H",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::Si => "Si",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Fe => "Fe",
            Element::Zn => "Zn",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::I => "I",
        }
    }

    pub fn atomic_number(self) -> u8 {
        self as u8
    }

    /// Standard atomic mass in g/mol.
    pub fn mass(self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::B => 10.81,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::F => 18.998,
            Element::Na => 22.990,
            Element::Mg => 24.305,
            Element::Si => 28.085,
            Element::P => 30.974,
            Element::S => 32.06,
            Element::Cl => 35.45,
            Element::K => 39.098,
            Element::Ca => 40.078,
            Element::Fe => 55.845,
            Element::Zn => 65.38,
            Element::Se => 78.971,
            Element::Br => 79.904,
            Element::I => 126.904,
        }
    }

    pub fn is_hydrogen(self) -> bool {
        self == Element::H
    }

    /// Guesses the element from an atom label such as a force-field type
    /// (`C_3`, `N.ar`, `Cl`) or an atom name (`CL1`, `H12`).
    ///
    /// A two-letter symbol is only accepted when the label's second character
    /// is lower case, so `CA` reads as carbon while `Ca` reads as calcium.
    pub fn guess(label: &str) -> Option<Element> {
        let letters: String = label
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if letters.is_empty() {
            return None;
        }

        let mut chars = letters.chars();
        let first = chars.next()?;
        if let Some(second) = chars.next() {
            let pair = format!("{}{}", first, second).to_ascii_uppercase();
            if second.is_ascii_lowercase() {
                if let Some(element) = SYMBOL_TABLE.get(pair.as_str()) {
                    return Some(*element);
                }
            }
        }

        SYMBOL_TABLE
            .get(first.to_ascii_uppercase().to_string().as_str())
            .copied()
    }
}

impl Element {
    /// Infers the element of an atom from its force-field type, falling back
    /// to its name.
    ///
    /// Only types that start with a capital letter (`C_3`, `N.ar`, `Cl`) are
    /// trusted; lower-case types such as `ca` or `hc` do not spell an element
    /// symbol reliably.
    pub fn infer(force_field_type: &str, name: &str) -> Option<Element> {
        let from_type = force_field_type
            .trim()
            .chars()
            .next()
            .filter(char::is_ascii_uppercase)
            .and_then(|_| Element::guess(force_field_type));
        from_type.or_else(|| Element::guess(name))
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SYMBOL_TABLE
            .get(s.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
