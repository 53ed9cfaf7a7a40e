//! Markdown run summary
//!
//! Renders a [`HarvestReport`] as a short human-readable report written
//! next to the export.

use crate::crawler::HarvestReport;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of a harvest run
///
/// # Arguments
///
/// * `report` - The finished run
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn write_markdown_summary(report: &HarvestReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a harvest report as markdown
pub fn format_markdown_summary(report: &HarvestReport) -> String {
    let stats = &report.stats;
    let mut md = String::new();

    md.push_str("# Catalog Harvest Summary\n\n");

    md.push_str("## Run Information\n\n");
    if let Some(started) = stats.started_at {
        md.push_str(&format!("- **Started**: {}\n", started.to_rfc3339()));
    }
    if let Some(finished) = stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = stats.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Outcome**: {}\n", report.outcome.as_str()));
    md.push_str(&format!(
        "- **Export**: {}\n\n",
        report.export_path.display()
    ));

    md.push_str("## Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages visited | {} |\n", stats.pages_visited));
    md.push_str(&format!("| Records exported | {} |\n", report.records));
    md.push_str(&format!("| Items skipped | {} |\n", stats.items_skipped));
    md.push_str(&format!("| Missing cells | {} |\n", stats.missing_cells));
    md.push_str(&format!("| Retries | {} |\n\n", stats.retries));

    if !report.outcome.is_success() {
        md.push_str("## Warning\n\n");
        md.push_str(
            "The run stopped before the end of the catalog. \
             The export holds every record collected until then.\n\n",
        );
    }

    md
}
