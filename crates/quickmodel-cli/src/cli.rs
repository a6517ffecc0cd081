use clap::{Args, Parser, Subcommand};
use quickmodel::core::units::SimLength;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    name = "quickmodel",
    author = "QuickModel Developers",
    version,
    about = "QuickModel CLI - Build, refine and package homology models of a target protein with the Ensembler toolkit in a single run.",
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

    /// The Ensembler project directory to work in.
    #[arg(
        short = 'C',
        long,
        global = true,
        value_name = "DIR",
        default_value = "."
    )]
    pub project_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full quick-model pipeline for one target.
    Run(RunArgs),
    /// Initialize the project directory tree if it does not exist yet.
    Init(InitArgs),
    /// Print the sequence identity histogram of a target's template alignment report.
    Histogram(HistogramArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Path to a run file in TOML format. Command-line flags override its values.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Target ---
    /// Model an existing target of the project by id (e.g., EGFR_HUMAN_D0).
    #[arg(long, value_name = "ID", conflicts_with = "target_entry_name")]
    pub target_id: Option<String>,

    /// Discover the target from a UniProt entry name (e.g., EGFR_HUMAN).
    #[arg(long, value_name = "NAME")]
    pub target_entry_name: Option<String>,

    /// Regular expression selecting UniProt domains (e.g., '^Protein kinase').
    #[arg(long, value_name = "REGEX")]
    pub domain_regex: Option<String>,

    // --- Templates ---
    /// Use these already-resolved templates as-is. Repeatable or comma-separated.
    #[arg(long = "template-id", value_name = "ID", value_delimiter = ',')]
    pub template_ids: Vec<String>,

    /// Gather templates from these PDB entries. Repeatable or comma-separated.
    #[arg(long = "pdb-id", value_name = "ID", value_delimiter = ',')]
    pub pdb_ids: Vec<String>,

    /// Restrict a PDB entry to the given chains. Repeatable.
    /// Example: --chain 2H8H:A,B
    #[arg(long = "chain", value_name = "PDB:CHAINS")]
    pub chains: Vec<String>,

    /// Gather templates from the UniProt entries matching this query.
    #[arg(long, value_name = "QUERY")]
    pub template_query: Option<String>,

    /// Keep templates whose sequence identity to the target is above this percentage.
    /// Prompted for interactively when omitted.
    #[arg(long, value_name = "PERCENT")]
    pub seqid_cutoff: Option<f64>,

    /// Additional local directories to search for template structures. Repeatable.
    #[arg(long = "structure-dir", value_name = "DIR")]
    pub structure_dirs: Vec<PathBuf>,

    // --- Modeling ---
    /// Override `modeling.loopmodel` from the run file.
    #[command(flatten)]
    pub loop_modeling: LoopModeling,

    /// Length of each MD refinement (e.g., '100ps', '1ns'). Bare numbers are picoseconds.
    #[arg(long, value_name = "LENGTH")]
    pub sim_length: Option<SimLength>,

    // --- Packaging ---
    /// Override `packaging.fah` from the run file.
    #[command(flatten)]
    pub fah_packaging: FahPackaging,

    /// Number of Folding@home clones per model.
    #[arg(long, value_name = "INT")]
    pub fah_clones: Option<u32>,

    // --- Toolkit ---
    /// The Ensembler executable to invoke.
    #[arg(long, value_name = "PROGRAM")]
    pub executable: Option<String>,

    /// Set a specific configuration value, overriding the run file.
    /// Can be used multiple times. Example: -S templates.seqid-cutoff=50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// A group to handle mutually exclusive boolean flags for template loop modeling.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct LoopModeling {
    /// Model missing loops in the templates before building models.
    #[arg(long)]
    pub loopmodel: bool,
    /// Build models from the templates without loop modeling.
    #[arg(long)]
    pub no_loopmodel: bool,
}

impl LoopModeling {
    pub fn as_override(&self) -> Option<bool> {
        match (self.loopmodel, self.no_loopmodel) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// A group to handle mutually exclusive boolean flags for Folding@home packaging.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct FahPackaging {
    /// Package the refined models for Folding@home.
    #[arg(long)]
    pub package_for_fah: bool,
    /// Skip Folding@home packaging even if the run file enables it.
    #[arg(long)]
    pub no_package_for_fah: bool,
}

impl FahPackaging {
    pub fn as_override(&self) -> Option<bool> {
        match (self.package_for_fah, self.no_package_for_fah) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// The Ensembler executable to invoke.
    #[arg(long, value_name = "PROGRAM")]
    pub executable: Option<String>,
}

/// Arguments for the `histogram` subcommand.
#[derive(Args, Debug)]
pub struct HistogramArgs {
    /// The target whose alignment report is read.
    #[arg(long, required = true, value_name = "ID")]
    pub target: String,

    /// Also list the templates that a cutoff would select.
    #[arg(long, value_name = "PERCENT")]
    pub cutoff: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_arguments_collect_repeated_and_delimited_values() {
        let cli = Cli::try_parse_from([
            "quickmodel",
            "-vv",
            "run",
            "--target-id",
            "EGFR_HUMAN_D0",
            "--template-id",
            "T1,T2",
            "--template-id",
            "T3",
            "--chain",
            "2H8H:A,B",
            "--sim-length",
            "1ns",
            "--no-loopmodel",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.project_dir, PathBuf::from("."));
        let Commands::Run(args) = cli.command else {
            panic!("expected the run command");
        };
        assert_eq!(args.template_ids, vec!["T1", "T2", "T3"]);
        assert_eq!(args.chains, vec!["2H8H:A,B"]);
        assert_eq!(args.sim_length.unwrap().picoseconds(), 1000.0);
        assert_eq!(args.loop_modeling.as_override(), Some(false));
    }

    #[test]
    fn target_id_and_entry_name_conflict() {
        let result = Cli::try_parse_from([
            "quickmodel",
            "run",
            "--target-id",
            "A",
            "--target-entry-name",
            "B",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn loopmodel_flags_are_mutually_exclusive() {
        let result = Cli::try_parse_from(["quickmodel", "run", "--loopmodel", "--no-loopmodel"]);
        assert!(result.is_err());
    }

    #[test]
    fn fah_packaging_flags_are_mutually_exclusive() {
        let result = Cli::try_parse_from([
            "quickmodel",
            "run",
            "--package-for-fah",
            "--no-package-for-fah",
        ]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["quickmodel", "run", "--no-package-for-fah"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected the run command");
        };
        assert_eq!(args.fah_packaging.as_override(), Some(false));
    }

    #[test]
    fn invalid_sim_length_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from(["quickmodel", "run", "--sim-length", "10 parsecs"]);
        assert!(result.is_err());
    }

    #[test]
    fn project_dir_is_global() {
        let cli =
            Cli::try_parse_from(["quickmodel", "histogram", "--target", "T", "-C", "/tmp/p"])
                .unwrap();
        assert_eq!(cli.project_dir, PathBuf::from("/tmp/p"));
    }
}
