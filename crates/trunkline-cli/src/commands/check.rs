// Command handler: check
//
// Loads and normalizes a trace, then prints the trace report together with
// the advisory certificate audit.

use std::fmt::Write as _;
use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;
use trunkline_conformance::report::TraceReport;

use super::helpers::{normalize_options, parse_output_format, read_normalized};
use crate::OutputFormat;

#[derive(Serialize)]
struct CheckOutput<'a> {
    file: String,
    #[serde(flatten)]
    report: &'a TraceReport,
}

/// Returns whether every invariant held.
pub(crate) fn run_check_command(file: &Path, format: &str, empty_moves: &str) -> miette::Result<bool> {
    let format = parse_output_format(format)?;
    let trace = read_normalized(file, normalize_options(empty_moves)?)?;
    let report = TraceReport::from_trace(&trace);

    match format {
        OutputFormat::Json => {
            let output = CheckOutput {
                file: file.display().to_string(),
                report: &report,
            };
            println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
        }
        OutputFormat::Text => print!("{}", render_report_text(&report)),
    }

    Ok(report.passed)
}

pub(crate) fn render_report_text(report: &TraceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Trace: {}", report.title);
    let _ = writeln!(
        out,
        "Steps: {} ({} history)",
        report.steps.len(),
        report.history_shape.as_str()
    );
    let _ = writeln!(
        out,
        "Checks: {} passed, {} failed",
        report.checks_passed, report.checks_failed
    );

    for step in report.failing_steps() {
        let geometry = step.geometry.map_or("none", |g| g.as_str());
        let _ = writeln!(out, "  step {} [{}] {}", step.step_id, geometry, step.event);
        for check in &step.failing {
            let _ = writeln!(out, "    FAIL {}: {}", check.invariant, check.detail());
        }
    }

    let unjustified: Vec<_> = report.unjustified_moves().collect();
    if !unjustified.is_empty() {
        let _ = writeln!(out, "Unjustified moves (advisory):");
        for mv in unjustified {
            let _ = writeln!(
                out,
                "  step {}, {}: {} {} -> {} without a {} certificate",
                mv.step_id, mv.replica, mv.boundary, mv.from, mv.to, mv.required
            );
        }
    }

    if report.passed {
        let _ = writeln!(out, "PASSED");
    } else {
        let first = report
            .first_failing_step
            .map_or_else(String::new, |id| format!(" (first at step {id})"));
        let _ = writeln!(out, "FAILED: {} failing check(s){first}", report.checks_failed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use trunkline_conformance::normalize;
    use trunkline_ir::{ReplicaMap, ReplicaState, Step, Trace};

    #[test]
    fn text_report_lists_failures() {
        let mut replica = ReplicaState::new(1);
        replica.trim = 2;
        let mut replicas = ReplicaMap::new();
        replicas.insert("R1".into(), replica);
        let trace = normalize(&Trace::new("trim cliff", vec![Step::new(0, replicas)]));

        let text = render_report_text(&TraceReport::from_trace(&trace));
        assert!(text.contains("FAIL T ≤ C (R1)"), "{text}");
        assert!(text.contains("FAILED: 1 failing check(s) (first at step 0)"), "{text}");
    }
}
