//! Replay a saved fuzzer input against one of the harnesses.
//!
//! Usage: fuzzbound-replay <archive|markup> <FILE>

use clap::{Parser, ValueEnum};
use fuzzbound::replay::{self, Target};
use fuzzbound::{Harness, Limits};
use std::path::PathBuf;
use std::process::ExitCode;

/// Reproduce a crashing input outside the fuzzing engine
#[derive(Parser)]
#[command(name = "fuzzbound-replay")]
#[command(version, about = "Replay a saved input against a fuzzbound harness", long_about = None)]
struct Cli {
    /// Harness to run the input through
    #[arg(value_enum)]
    target: TargetArg,

    /// Input file saved by the fuzzer
    input: PathBuf,

    /// Print the traversal report of every pass
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Override the entry cap
    #[arg(long)]
    max_units: Option<usize>,

    /// Override the per-entry payload budget in bytes
    #[arg(long)]
    max_bytes_per_unit: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Archive,
    Markup,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Archive => Target::Archive,
            TargetArg::Markup => Target::Markup,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut limits = Limits::new();
    if let Some(units) = cli.max_units {
        limits = limits.with_max_units(units);
    }
    if let Some(bytes) = cli.max_bytes_per_unit {
        limits = limits.with_max_bytes_per_unit(bytes);
    }
    let harness = Harness::new(limits);

    let replay = match replay::replay_file(&harness, cli.target.into(), &cli.input) {
        Ok(replay) => replay,
        Err(e) => {
            eprintln!("Failed to read {}: {}", cli.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = replay.write_summary(&mut stdout, cli.verbose) {
        eprintln!("Failed to write summary: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
