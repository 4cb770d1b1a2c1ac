// Command handler: diff

use std::fmt::Write as _;
use std::path::Path;

use miette::{miette, IntoDiagnostic};
use trunkline_conformance::diff::step_diff;
use trunkline_conformance::NormalizeOptions;
use trunkline_ir::StepDiff;

use super::helpers::{parse_output_format, read_normalized};
use crate::OutputFormat;

pub(crate) fn run_diff_command(file: &Path, step: usize, format: &str) -> miette::Result<()> {
    let format = parse_output_format(format)?;
    let trace = read_normalized(file, NormalizeOptions::default())?;
    let diff = step_diff(step, &trace.steps).ok_or_else(|| {
        miette!(
            "step index {step} is out of range (trace has {} steps)",
            trace.steps.len()
        )
    })?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&diff).into_diagnostic()?);
        }
        OutputFormat::Text => {
            let id = trace.steps[step].id;
            print!("{}", render_diff_text(id, &diff));
        }
    }
    Ok(())
}

pub(crate) fn render_diff_text(step_id: u64, diff: &StepDiff) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Step {step_id}");
    if diff.is_quiet() {
        let _ = writeln!(out, "  no replica changes");
    }
    for c in &diff.boundaries_changed {
        let _ = writeln!(out, "  {} {}: {} -> {}", c.replica, c.boundary, c.old, c.new);
    }
    for c in &diff.entries_added {
        let _ = writeln!(
            out,
            "  {} + idx={} val={} epoch={}",
            c.replica, c.entry.index, c.entry.value, c.entry.epoch
        );
    }
    for c in &diff.entries_removed {
        let _ = writeln!(
            out,
            "  {} - idx={} val={} epoch={}",
            c.replica, c.entry.index, c.entry.value, c.entry.epoch
        );
    }
    for c in &diff.epoch_changed {
        let _ = writeln!(out, "  {} epoch: {} -> {}", c.replica, c.old, c.new);
    }
    for c in &diff.role_changed {
        let _ = writeln!(out, "  {} role: {} -> {}", c.replica, c.old, c.new);
    }
    for c in &diff.flags_changed {
        let _ = writeln!(out, "  {} {}: {} -> {}", c.replica, c.flag, c.old, c.new);
    }
    for cert in &diff.certs_issued {
        let _ = writeln!(out, "  certificate {} by {}: {}", cert.kind, cert.holder, cert.detail);
    }
    if diff.violation_appeared {
        let _ = writeln!(out, "  violation appeared");
    }
    if diff.violation_resolved {
        let _ = writeln!(out, "  violation resolved");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use trunkline_ir::diff::BoundaryChange;
    use trunkline_ir::BoundaryKey;

    #[test]
    fn renders_boundary_changes() {
        let diff = StepDiff {
            boundaries_changed: vec![BoundaryChange {
                replica: "R2".into(),
                boundary: BoundaryKey::C,
                old: 1,
                new: 2,
            }],
            ..StepDiff::default()
        };
        let text = render_diff_text(4, &diff);
        assert!(text.starts_with("Step 4\n"));
        assert!(text.contains("  R2 C: 1 -> 2"));
        assert!(!text.contains("no replica changes"));
    }

    #[test]
    fn quiet_diff_says_so() {
        let text = render_diff_text(0, &StepDiff::default());
        assert!(text.contains("no replica changes"));
    }
}
