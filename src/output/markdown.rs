//! Markdown summary generation
//!
//! This module renders a run report as a human-readable markdown document.

use crate::output::report::RunReport;
use crate::output::traits::SinkResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a run to `output_path`
///
/// # Arguments
///
/// * `report` - The finished run's report
/// * `config_hash` - Hash of the configuration file, if one was used
/// * `output_path` - Path where the markdown file should be written
pub fn write_markdown_report(
    report: &RunReport,
    config_hash: Option<&str>,
    output_path: &Path,
) -> SinkResult<()> {
    let markdown = format_markdown_report(report, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_report(report: &RunReport, config_hash: Option<&str>) -> String {
    let mut md = String::new();

    md.push_str("# Sitemap Harvest Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Root Sitemap**: {}\n", report.resolve.root));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        report.elapsed.as_secs_f64()
    ));
    md.push_str(&format!(
        "- **Status**: {}\n",
        if report.cancelled { "cancelled" } else { "completed" }
    ));
    if let Some(hash) = config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Sitemaps\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Visited | {} |\n", report.resolve.sitemaps_visited));
    md.push_str(&format!("| Skipped | {} |\n", report.resolve.skipped.len()));
    md.push_str(&format!("| Abandoned | {} |\n", report.resolve.abandoned.len()));
    md.push_str(&format!(
        "| Malformed Entries | {} |\n",
        report.resolve.malformed_entries
    ));
    md.push_str(&format!(
        "| Duplicate URLs | {} |\n\n",
        report.resolve.duplicates_dropped
    ));

    md.push_str("## Articles\n\n");
    md.push_str("| State | Count |\n");
    md.push_str("|-------|-------|\n");
    md.push_str(&format!("| Discovered | {} |\n", report.discovered));
    md.push_str(&format!("| Complete | {} |\n", report.extracted));
    md.push_str(&format!("| Failed | {} |\n\n", report.failed));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        report.success_rate()
    ));
    md.push_str(&format!(
        "- **Failure Ratio**: {:.3}\n\n",
        report.failure_ratio()
    ));

    if !report.resolve.skipped.is_empty() {
        md.push_str("## Skipped Sitemaps\n\n");
        md.push_str("| URL | Depth | Reason |\n");
        md.push_str("|-----|-------|--------|\n");
        for failure in &report.resolve.skipped {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                table_cell(&failure.url),
                failure.depth,
                table_cell(&failure.reason.to_string())
            ));
        }
        md.push('\n');
    }

    if !report.failures.is_empty() {
        md.push_str("## Failed Articles\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");
        for failure in &report.failures {
            md.push_str(&format!(
                "| {} | {} |\n",
                table_cell(&failure.url),
                table_cell(&failure.reason)
            ));
        }
        md.push('\n');
    }

    md
}

/// Makes `text` safe inside one table cell: pipes escaped, line breaks folded
fn table_cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}
