use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use treepatch::MatchMode;

#[derive(Parser)]
#[command(name = "treepatch")]
#[command(about = "Reconcile regenerated source trees with maintained hand edits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the delta between an original and a modified tree as a patch set
    Diff {
        /// Baseline tree
        original: PathBuf,
        /// Edited variant of the baseline
        modified: PathBuf,
        /// Directory receiving the patch set
        patches: PathBuf,
    },
    /// Rebuild the modified tree from a baseline plus a patch set
    Patch {
        /// Baseline tree
        original: PathBuf,
        /// Patch set produced by `diff`
        patches: PathBuf,
        /// Directory receiving the rebuilt tree
        output: PathBuf,
        /// Tolerance when relocating hunks
        #[arg(long, value_enum, default_value = "fuzzy")]
        mode: Mode,
        /// Write the full report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Exact,
    Offset,
    Fuzzy,
}

impl From<Mode> for MatchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Exact => MatchMode::Exact,
            Mode::Offset => MatchMode::Offset,
            Mode::Fuzzy => MatchMode::Fuzzy,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Diff {
            original,
            modified,
            patches,
        } => match treepatch::commands::diff::run(&original, &modified, &patches) {
            Ok(()) => {
                println!("Patch set written to {}", patches.display());
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(2);
            }
        },
        Commands::Patch {
            original,
            patches,
            output,
            mode,
            report,
        } => match treepatch::commands::patch::run(&original, &patches, &output, mode.into()) {
            Ok(result) => {
                println!(
                    "{} hunk(s) applied, {} failed, {} offset warning(s)",
                    result.successes, result.failures, result.warnings
                );
                println!(
                    "modes: {} exact, {} offset, {} fuzzy",
                    result.exacts, result.offsets, result.fuzzies
                );
                for file in &result.files {
                    for hunk in file.hunks.iter().filter(|h| !h.success) {
                        println!("FAILED {}: {} ({})", file.original_path, hunk.header, hunk.summary);
                    }
                }
                if let Some(report_path) = report {
                    if let Err(e) = result.save(&report_path) {
                        eprintln!("Error: failed to write report: {}", e);
                        process::exit(2);
                    }
                }
                if result.failures > 0 {
                    process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(2);
            }
        },
    }
}
