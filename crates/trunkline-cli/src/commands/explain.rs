// Command handler: explain

use std::fmt::Write as _;

use miette::IntoDiagnostic;
use serde::Serialize;
use trunkline_conformance::geometry::GEOMETRY_RULES;
use trunkline_ir::invariant::INVARIANT_FAMILIES;
use trunkline_ir::{BoundaryKey, CertificateType, Geometry};

use super::helpers::parse_output_format;
use crate::OutputFormat;

#[derive(Serialize)]
struct Entry {
    name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'static str>,
    description: &'static str,
}

#[derive(Serialize)]
struct Catalogue {
    geometries: Vec<Entry>,
    boundaries: Vec<Entry>,
    certificates: Vec<Entry>,
    invariants: Vec<Entry>,
    geometry_rules: Vec<&'static str>,
}

fn catalogue() -> Catalogue {
    Catalogue {
        geometries: Geometry::ALL
            .iter()
            .map(|g| Entry {
                name: g.as_str(),
                label: None,
                description: g.description(),
            })
            .collect(),
        boundaries: BoundaryKey::ALL
            .iter()
            .map(|b| Entry {
                name: b.as_str(),
                label: Some(b.label()),
                description: b.description(),
            })
            .collect(),
        certificates: CertificateType::ALL
            .iter()
            .map(|c| Entry {
                name: c.as_str(),
                label: None,
                description: c.description(),
            })
            .collect(),
        invariants: INVARIANT_FAMILIES
            .iter()
            .map(|&(name, description)| Entry {
                name,
                label: None,
                description,
            })
            .collect(),
        geometry_rules: GEOMETRY_RULES.iter().map(|r| r.name).collect(),
    }
}

fn render_text(catalogue: &Catalogue) -> String {
    let mut out = String::new();
    let sections = [
        ("Geometries", &catalogue.geometries),
        ("Boundaries", &catalogue.boundaries),
        ("Certificates", &catalogue.certificates),
        ("Invariant families", &catalogue.invariants),
    ];
    for (heading, entries) in sections {
        let _ = writeln!(out, "{heading}:");
        for entry in entries {
            match entry.label {
                Some(label) => {
                    let _ = writeln!(out, "  {} ({label}): {}", entry.name, entry.description);
                }
                None => {
                    let _ = writeln!(out, "  {}: {}", entry.name, entry.description);
                }
            }
        }
        out.push('\n');
    }
    let _ = writeln!(out, "Geometry rules (first match wins):");
    for (i, rule) in catalogue.geometry_rules.iter().enumerate() {
        let _ = writeln!(out, "  {}. {rule}", i + 1);
    }
    out
}

pub(crate) fn run_explain_command(format: &str) -> miette::Result<()> {
    let catalogue = catalogue();
    match parse_output_format(format)? {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&catalogue).into_diagnostic()?
            );
        }
        OutputFormat::Text => print!("{}", render_text(&catalogue)),
    }
    Ok(())
}
