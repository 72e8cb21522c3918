//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Pretty-print any serializable value as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a section heading underlined to `width`
pub fn print_heading(title: &str, width: usize) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(width));
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format an already-scaled percentage
pub fn format_percentage(percentage: f64) -> String {
    format!("{:.2}%", percentage)
}

/// Format a [0, 1] accuracy as a percentage
pub fn format_accuracy(accuracy: f64) -> String {
    format_percentage(accuracy * 100.0)
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "ready" | "success" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" | "not ready" | "error" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Mark the predicted row so it stands out in tables
pub fn predicted_marker(is_predicted: bool) -> String {
    if is_predicted {
        "●".green().bold().to_string()
    } else {
        String::new()
    }
}

/// Format a UTC timestamp as `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(37.5), "37.50%");
        assert_eq!(format_accuracy(0.875), "87.50%");
        assert_eq!(format_accuracy(1.0), "100.00%");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-09 14:05:07");
    }

    #[test]
    fn test_unknown_status_is_plain() {
        assert_eq!(color_status("pending"), "pending");
    }
}
