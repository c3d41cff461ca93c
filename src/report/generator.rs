//! Report generation.
//!
//! Renders summary rows as CSV or JSON and prints the console summary.

use crate::models::{RunSummary, SummaryRow};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Fixed column order of the tabular report.
pub const COLUMNS: [&str; 6] = [
    "week",
    "sources",
    "keyword",
    "hits",
    "total_posts",
    "hits_per_100_posts",
];

/// Generate a CSV report. The header is always present, even with no rows.
pub fn generate_csv_report(rows: &[SummaryRow]) -> String {
    let mut output = String::new();

    output.push_str(&COLUMNS.join(","));
    output.push('\n');

    for row in rows {
        output.push_str(&generate_csv_row(row));
    }

    output
}

fn generate_csv_row(row: &SummaryRow) -> String {
    format!(
        "{},{},{},{},{},{:?}\n",
        escape_csv(row.week.as_str()),
        escape_csv(&row.sources),
        escape_csv(&row.keyword),
        row.hits,
        row.total_posts,
        row.hits_per_100_posts
    )
}

fn escape_csv(text: &str) -> String {
    // Quote fields containing a delimiter, quote or line break
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Generate a JSON report.
pub fn generate_json_report(rows: &[SummaryRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).map_err(Into::into)
}

/// Write report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}

/// Generate the console summary printed after a run.
pub fn generate_summary_text(summary: &RunSummary, output: &Path) -> String {
    let mut lines = Vec::new();

    lines.push("📊 Trend Summary:".to_string());
    lines.push(format!("   Posts analyzed: {}", summary.total_posts));
    lines.push(format!("   Weeks covered: {}", summary.buckets));
    lines.push(format!("   Rows written: {}", summary.rows));

    let top = summary.top_keywords(5);
    if !top.is_empty() {
        lines.push("   Top keywords:".to_string());
        for (keyword, hits) in top {
            lines.push(format!("     - {}: {}", keyword, hits));
        }
    }

    lines.push(format!("\n✅ Report saved to: {}", output.display()));
    lines.join("\n")
}
