//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Normalize recorded consensus traces and check them against the boundary \
    lattice, authority, coupling and CRDT convergence laws.\n\n\
    Typical flow:\n  \
    1. trunkline check trace.json\n  \
    2. trunkline diff trace.json --step 3\n  \
    3. trunkline normalize trace.json --out normalized.json";

#[derive(Parser)]
#[command(name = "trunkline")]
#[command(about = "Normalize and verify recorded consensus traces")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Normalize a trace and report every failing invariant
    #[command(display_order = 1)]
    Check {
        /// Path to the trace JSON file
        file: PathBuf,
        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
        /// Meaning of an explicit empty boundaries_moved: rederive | preserve
        #[arg(long, default_value = "rederive")]
        empty_moves: String,
    },

    /// Write the normalized trace as JSON
    #[command(display_order = 2)]
    Normalize {
        /// Path to the trace JSON file
        file: PathBuf,
        /// Output path (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Meaning of an explicit empty boundaries_moved: rederive | preserve
        #[arg(long, default_value = "rederive")]
        empty_moves: String,
    },

    /// Show what changed between a step and its predecessor
    #[command(display_order = 3)]
    Diff {
        /// Path to the trace JSON file
        file: PathBuf,
        /// Zero-based step index
        #[arg(long)]
        step: usize,
        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Describe geometries, boundaries, certificates and invariant families
    #[command(display_order = 4)]
    Explain {
        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },
}
