use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "fepmerge - atom mapping, alignment and merging of ligand pairs for alchemical free-energy setup.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map, align and merge two ligands, then write the perturbation files.
    Merge(MergeArgs),
    /// Resolve the atom mapping only and print it.
    Map(MapArgs),
    /// List the supported file formats.
    Formats,
}

/// Inputs shared by every command that resolves a mapping.
#[derive(Args, Debug, Clone)]
pub struct MappingArgs {
    /// Structure file of the lambda=0 system (BGF, MOL2 or PDB).
    #[arg(short = 'a', long, required = true, value_name = "PATH")]
    pub system0: PathBuf,

    /// Structure file of the lambda=1 system (BGF, MOL2 or PDB).
    #[arg(short = 'b', long, required = true, value_name = "PATH")]
    pub system1: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// CSV file of 'idxA,idxB' pairs; skips the substructure search.
    #[arg(short, long, value_name = "PATH")]
    pub mapping: Option<PathBuf>,

    /// Atom pairs the search must keep, e.g. "1-3,4-8".
    #[arg(short, long, value_name = "PAIRS")]
    pub prematch: Option<String>,

    /// Substructure search timeout in seconds.
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Index of the perturbed molecule in the lambda=0 system.
    #[arg(long, value_name = "INT")]
    pub molecule0: Option<usize>,

    /// Index of the perturbed molecule in the lambda=1 system.
    #[arg(long, value_name = "INT")]
    pub molecule1: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S mapping.max-candidates=5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Ring policy switches; an absent flag defers to the config file.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PolicyFlags {
    /// Allow mappings that open or close a ring.
    #[arg(long)]
    pub allow_ring_breaking: bool,
    /// Allow mappings between rings of different sizes.
    #[arg(long)]
    pub allow_ring_size_change: bool,
}

/// Arguments for the `merge` subcommand.
#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub mapping: MappingArgs,

    #[command(flatten)]
    pub policy: PolicyFlags,

    /// Output stem; files are written as <OUTPUT>.{prm7,rst7,pdb,pert,mapping}.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `map` subcommand.
#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(flatten)]
    pub mapping: MappingArgs,

    /// Write the resolved mapping as CSV to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
