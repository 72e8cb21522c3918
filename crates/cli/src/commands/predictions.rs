//! Stored prediction lookups

use anyhow::Result;
use colored::Colorize;
use style_lib::store::PredictionRecord;
use tabled::Tabled;

use crate::client::{ApiClient, FoundPrediction, RecentPredictions};
use crate::output::{
    format_percentage, format_timestamp, predicted_marker, print_heading, print_json, print_table,
    print_warning, OutputFormat,
};

#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Prediction ID")]
    prediction_id: String,
    #[tabled(rename = "Style")]
    style: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Predicted At")]
    predicted_at: String,
}

impl From<&PredictionRecord> for PredictionRow {
    fn from(record: &PredictionRecord) -> Self {
        let confidence = record
            .probabilities
            .iter()
            .find(|s| s.is_predicted)
            .map(|s| format_percentage(s.percentage))
            .unwrap_or_default();

        Self {
            prediction_id: record.prediction_id.clone(),
            style: record.predicted_style.to_string(),
            confidence,
            predicted_at: format_timestamp(&record.predicted_at),
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: i64,
}

#[derive(Tabled)]
struct ScoreRow {
    #[tabled(rename = "Learning Style")]
    style: String,
    #[tabled(rename = "Probability")]
    percentage: String,
    #[tabled(rename = "Predicted")]
    predicted: String,
}

/// List the most recent stored predictions
pub async fn list_predictions(
    client: &ApiClient,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let path = match limit {
        Some(limit) => format!("predictions?limit={}", limit),
        None => "predictions".to_string(),
    };
    let result: RecentPredictions = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.predictions.is_empty() {
                print_warning("No stored predictions");
                return Ok(());
            }

            let rows: Vec<PredictionRow> =
                result.predictions.iter().map(PredictionRow::from).collect();
            print_table(&rows);
            println!("\nTotal: {} predictions", result.count);
        }
    }

    Ok(())
}

/// Show one stored prediction by prediction id or store id
pub async fn get_prediction(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let path = format!("predictions/{}", id);
    let result: FoundPrediction = client.get(&path).await?;
    let record = &result.prediction;

    match format {
        OutputFormat::Json => print_json(record)?,
        OutputFormat::Table => {
            print_heading("Stored Prediction", 60);
            println!("Store ID:               {}", record.id.to_string().cyan());
            println!("Prediction ID:          {}", record.prediction_id.cyan());
            println!(
                "Predicted style:        {}",
                record.predicted_style.to_string().green().bold()
            );
            println!("Predicted at:           {}", format_timestamp(&record.predicted_at));
            println!();

            let scores: Vec<ScoreRow> = record
                .probabilities
                .iter()
                .map(|s| ScoreRow {
                    style: s.style.to_string(),
                    percentage: format_percentage(s.percentage),
                    predicted: predicted_marker(s.is_predicted),
                })
                .collect();
            print_table(&scores);
            println!();

            println!("{}", "Input".bold());
            let fields: Vec<FieldRow> = style_lib::Field::ALL
                .iter()
                .map(|&field| FieldRow {
                    field: field.name(),
                    value: record.user_data.get(field),
                })
                .collect();
            print_table(&fields);
        }
    }

    Ok(())
}
