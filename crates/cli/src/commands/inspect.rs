//! Dataset inspection command

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use style_lib::training::{Dataset, DatasetSummary};
use tabled::Tabled;

use crate::output::{
    format_percentage, print_heading, print_json, print_table, print_warning, OutputFormat,
};

#[derive(Tabled)]
struct ClassRow {
    #[tabled(rename = "Learning Style")]
    style: String,
    #[tabled(rename = "Rows")]
    rows: usize,
    #[tabled(rename = "Share")]
    share: String,
}

/// Load and validate a dataset, then print its shape
pub fn inspect(data_path: &Path, format: OutputFormat) -> Result<()> {
    let dataset = Dataset::from_csv_path(data_path)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;
    let summary = dataset.summary();

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => print_summary(&summary, data_path),
    }

    Ok(())
}

fn print_summary(summary: &DatasetSummary, data_path: &Path) {
    print_heading("Dataset Summary", 50);
    println!("File:                   {}", data_path.display().to_string().cyan());
    println!("Rows:                   {}", summary.rows);
    println!();

    let rows: Vec<ClassRow> = summary
        .class_counts
        .iter()
        .map(|&(style, count)| ClassRow {
            style: style.to_string(),
            rows: count,
            share: format_percentage(share(count, summary.rows)),
        })
        .collect();
    print_table(&rows);

    let missing: Vec<String> = summary
        .class_counts
        .iter()
        .filter(|(_, count)| *count == 0)
        .map(|(style, _)| style.to_string())
        .collect();
    if !missing.is_empty() {
        print_warning(&format!("No rows for: {}", missing.join(", ")));
    }

    println!();
    println!("{}", "Categorical Columns".bold());
    println!("{}", "-".repeat(50));
    for (field, values) in &summary.categories {
        let values: Vec<String> = values.iter().map(i64::to_string).collect();
        println!("{:<24}{}", field.name(), values.join(", "));
    }
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share() {
        assert_eq!(share(1, 4), 25.0);
        assert_eq!(share(0, 0), 0.0);
    }
}
