#![doc = include_str!("../README.md")]

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            file,
            format,
            empty_moves,
        } => {
            let passed = commands::check::run_check_command(&file, &format, &empty_moves)?;
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::Normalize {
            file,
            out,
            empty_moves,
        } => {
            commands::normalize::run_normalize_command(&file, out.as_deref(), &empty_moves)?;
        }
        Commands::Diff { file, step, format } => {
            commands::diff::run_diff_command(&file, step, &format)?;
        }
        Commands::Explain { format } => {
            commands::explain::run_explain_command(&format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_check_defaults() {
        let cli = Cli::try_parse_from(["trunkline", "check", "trace.json"]).unwrap();
        match cli.command {
            Commands::Check {
                format,
                empty_moves,
                ..
            } => {
                assert_eq!(format, "text");
                assert_eq!(empty_moves, "rederive");
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn parse_diff_requires_step() {
        assert!(Cli::try_parse_from(["trunkline", "diff", "trace.json"]).is_err());
        let cli =
            Cli::try_parse_from(["trunkline", "diff", "trace.json", "--step", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Diff { step: 3, .. }));
    }

    #[test]
    fn parse_normalize_out() {
        let cli = Cli::try_parse_from([
            "trunkline",
            "normalize",
            "trace.json",
            "--out",
            "normalized.json",
            "--empty-moves",
            "preserve",
        ])
        .unwrap();
        match cli.command {
            Commands::Normalize {
                out, empty_moves, ..
            } => {
                assert_eq!(out.unwrap().to_str(), Some("normalized.json"));
                assert_eq!(empty_moves, "preserve");
            }
            _ => panic!("expected normalize"),
        }
    }
}
