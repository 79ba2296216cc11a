//! Helpers for rendering command output.

use std::io::Write;

use cukehub_core::document::{Document, Tag};
use cukehub_core::store::ScenarioMatch;
use cukehub_core::writer::ExportReport;
use eyre::{Context, Result};

fn joined(tags: &[Tag]) -> String {
    tags.iter()
        .map(|tag| tag.name.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn write_document(writer: &mut dyn Write, document: &Document) -> Result<()> {
    let scenarios = document.feature.scenarios();
    writeln!(
        writer,
        "{} :: {} ({} scenarios)",
        document.relative_path.display(),
        document.feature.name,
        scenarios.len()
    )
    .wrap_err_with(|| format!("failed to write summary of {}", document.relative_path.display()))?;
    for scenario in scenarios {
        let mut line = format!(
            "  {} [steps: {}, examples: {}]",
            scenario.name, scenario.number_of_steps, scenario.number_of_examples
        );
        if !scenario.tags.is_empty() {
            line.push(' ');
            line.push_str(&joined(&scenario.tags));
        }
        writeln!(writer, "{line}")
            .wrap_err_with(|| format!("failed to write scenario {}", scenario.name))?;
    }
    Ok(())
}

pub(crate) fn write_tags(writer: &mut dyn Write, tags: &[String]) -> Result<()> {
    tags.iter()
        .try_for_each(|tag| writeln!(writer, "{tag}"))
        .wrap_err("failed to write tag list")
}

pub(crate) fn write_matches(writer: &mut dyn Write, matches: &[ScenarioMatch]) -> Result<()> {
    for found in matches {
        writeln!(
            writer,
            "{} :: {}",
            found.relative_path.display(),
            found.scenario_name
        )
        .wrap_err_with(|| format!("failed to write match {}", found.scenario_name))?;
    }
    Ok(())
}

pub(crate) fn write_export_report(
    writer: &mut dyn Write,
    errors: &mut dyn Write,
    report: &ExportReport,
) -> Result<()> {
    for path in &report.written {
        writeln!(writer, "wrote {}", path.display()).wrap_err("failed to write export listing")?;
    }
    for failure in &report.failures {
        writeln!(errors, "failed {}: {}", failure.document_id, failure.error)
            .wrap_err("failed to write export failure")?;
    }
    Ok(())
}
