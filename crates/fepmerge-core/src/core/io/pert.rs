use crate::core::models::merged::MergedMolecule;
use std::io::{self, Write};

/// Writes a SOMD perturbation file for a merged molecule.
///
/// Only atoms whose type or charge differs between the end states are
/// listed; dummy ends appear with the dummy type and zero charge.
pub fn write_pert(merged: &MergedMolecule, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "version 1")?;
    writeln!(writer, "molecule {}", merged.name)?;
    for atom in merged.atoms.iter().filter(|a| a.is_perturbed()) {
        writeln!(writer, "    atom")?;
        writeln!(writer, "        name           {}", atom.name())?;
        writeln!(writer, "        initial_type   {}", atom.type_at_lambda0())?;
        writeln!(writer, "        final_type     {}", atom.type_at_lambda1())?;
        writeln!(writer, "        initial_charge {:.5}", atom.charge_at_lambda0())?;
        writeln!(writer, "        final_charge   {:.5}", atom.charge_at_lambda1())?;
        writeln!(writer, "    endatom")?;
    }
    writeln!(writer, "endmolecule")?;
    Ok(())
}
