//! Offline training command

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use style_lib::training::{run_training, TrainingConfig, TrainingReport};
use style_lib::StructuredLogger;
use tabled::Tabled;

use crate::output::{
    format_accuracy, print_heading, print_json, print_success, print_table, OutputFormat,
};

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "Run")]
    run: usize,
    #[tabled(rename = "Seed")]
    seed: u64,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Time")]
    duration: String,
    #[tabled(rename = "Best")]
    best: String,
}

/// Train on `data_path` and write the artifacts into `out_dir`
pub async fn train(
    config: TrainingConfig,
    data_path: &Path,
    out_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let logger = StructuredLogger::new("lsd-train");
    let data_path = data_path.to_path_buf();
    let out = out_dir.to_path_buf();

    // Forest fitting is CPU-bound
    let report =
        tokio::task::spawn_blocking(move || run_training(&config, &data_path, &out, &logger))
            .await??;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report, out_dir),
    }

    Ok(())
}

fn print_report(report: &TrainingReport, out_dir: &Path) {
    print_heading("Training Summary", 50);
    println!("Train rows:             {}", report.train_rows);
    println!("Test rows:              {}", report.test_rows);
    println!("Encoded features:       {}", report.n_features);
    println!("Trees per forest:       {}", report.config.n_estimators);
    println!();

    let rows: Vec<RunRow> = report
        .runs
        .iter()
        .map(|r| RunRow {
            run: r.run,
            seed: r.seed,
            accuracy: format_accuracy(r.accuracy),
            duration: format!("{}ms", r.duration_ms),
            best: if r.run == report.best_run {
                "✓".green().bold().to_string()
            } else {
                String::new()
            },
        })
        .collect();
    print_table(&rows);
    println!();

    println!(
        "{} run {} (seed {}) with accuracy {}",
        "Best:".bold(),
        report.best_run,
        report.best_seed,
        format_accuracy(report.best_accuracy).green()
    );
    print_success(&format!("Artifacts written to {}", out_dir.display()));
}
