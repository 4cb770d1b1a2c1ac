// Command handler: normalize

use std::fs;
use std::path::Path;

use miette::IntoDiagnostic;
use tracing::info;

use super::helpers::{normalize_options, read_normalized};

pub(crate) fn run_normalize_command(
    file: &Path,
    out: Option<&Path>,
    empty_moves: &str,
) -> miette::Result<()> {
    let trace = read_normalized(file, normalize_options(empty_moves)?)?;
    let json = serde_json::to_string_pretty(&trace).into_diagnostic()?;

    match out {
        Some(path) => {
            fs::write(path, format!("{json}\n")).into_diagnostic()?;
            info!(path = %path.display(), steps = trace.steps.len(), "wrote normalized trace");
        }
        None => println!("{json}"),
    }
    Ok(())
}
