use crate::error::Result;
use fepmerge::core::io::FileFormat;

pub fn run() -> Result<()> {
    println!("{:<10} {:<8} DESCRIPTION", "EXTENSION", "READ");
    for format in FileFormat::ALL {
        println!(
            "{:<10} {:<8} {}",
            format!(".{}", format.extension()),
            if format.is_structure_input() { "yes" } else { "-" },
            format.description()
        );
    }
    Ok(())
}
