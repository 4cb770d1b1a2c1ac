// Shared helpers used across CLI command handlers: flag parsing and trace
// loading.

use std::fs;
use std::path::Path;

use miette::{miette, IntoDiagnostic, WrapErr};
use trunkline_conformance::{load_trace_str, EmptyMovesPolicy, NormalizeOptions, Normalizer};
use trunkline_ir::Trace;

use crate::OutputFormat;

pub(crate) fn parse_output_format(raw: &str) -> miette::Result<OutputFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(miette!(
            "Unknown output format: {other}. Use 'text' or 'json'."
        )),
    }
}

pub(crate) fn parse_empty_moves(raw: &str) -> miette::Result<EmptyMovesPolicy> {
    raw.trim()
        .to_ascii_lowercase()
        .parse::<EmptyMovesPolicy>()
        .map_err(|e| miette!("{e}"))
}

pub(crate) fn normalize_options(empty_moves: &str) -> miette::Result<NormalizeOptions> {
    Ok(NormalizeOptions {
        empty_moves: parse_empty_moves(empty_moves)?,
        ..NormalizeOptions::default()
    })
}

/// Read and validate a trace document. The result is not normalized.
pub(crate) fn read_trace(file: &Path) -> miette::Result<Trace> {
    let source = fs::read_to_string(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", file.display()))?;
    load_trace_str(&source)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid trace {}", file.display()))
}

pub(crate) fn read_normalized(file: &Path, options: NormalizeOptions) -> miette::Result<Trace> {
    let trace = read_trace(file)?;
    Ok(Normalizer::with_options(options).normalize(&trace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_flag_values() {
        assert_eq!(parse_output_format("JSON").unwrap(), OutputFormat::Json);
        assert!(parse_output_format("yaml").is_err());
        assert_eq!(parse_empty_moves("preserve").unwrap(), EmptyMovesPolicy::Preserve);
        assert!(parse_empty_moves("never").is_err());
        assert_eq!(normalize_options("rederive").unwrap(), NormalizeOptions::reference());
    }
}
