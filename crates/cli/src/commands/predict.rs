//! Single-record prediction command

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use style_lib::{Field, PredictionResponse, StudentRecord};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    format_percentage, predicted_marker, print_error, print_heading, print_json, print_table,
    OutputFormat,
};

/// A student record given as a JSON file, flags, or both (flags win)
#[derive(Debug, Default, Args)]
pub struct RecordArgs {
    /// JSON file holding the record
    #[arg(long, short = 'i')]
    pub file: Option<PathBuf>,

    #[arg(long)]
    pub study_hours: Option<i64>,
    #[arg(long)]
    pub attendance: Option<i64>,
    #[arg(long)]
    pub resources: Option<i64>,
    #[arg(long)]
    pub extracurricular: Option<i64>,
    #[arg(long)]
    pub motivation: Option<i64>,
    #[arg(long)]
    pub internet: Option<i64>,
    #[arg(long)]
    pub gender: Option<i64>,
    #[arg(long)]
    pub age: Option<i64>,
    #[arg(long)]
    pub online_courses: Option<i64>,
    #[arg(long)]
    pub discussions: Option<i64>,
    #[arg(long)]
    pub assignment_completion: Option<i64>,
    #[arg(long)]
    pub exam_score: Option<i64>,
    #[arg(long)]
    pub edu_tech: Option<i64>,
    #[arg(long)]
    pub stress_level: Option<i64>,
    #[arg(long)]
    pub final_grade: Option<i64>,
}

impl RecordArgs {
    fn flags(&self) -> [(Field, Option<i64>); 15] {
        [
            (Field::StudyHours, self.study_hours),
            (Field::Attendance, self.attendance),
            (Field::Resources, self.resources),
            (Field::Extracurricular, self.extracurricular),
            (Field::Motivation, self.motivation),
            (Field::Internet, self.internet),
            (Field::Gender, self.gender),
            (Field::Age, self.age),
            (Field::OnlineCourses, self.online_courses),
            (Field::Discussions, self.discussions),
            (Field::AssignmentCompletion, self.assignment_completion),
            (Field::ExamScore, self.exam_score),
            (Field::EduTech, self.edu_tech),
            (Field::StressLevel, self.stress_level),
            (Field::FinalGrade, self.final_grade),
        ]
    }

    /// Merge the file and flags into one JSON object
    pub fn to_body(&self) -> Result<Value> {
        let mut body = match &self.file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                match serde_json::from_str::<Value>(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
                {
                    Value::Object(map) => map,
                    _ => anyhow::bail!("{} must hold a JSON object", path.display()),
                }
            }
            None => Map::new(),
        };

        for (field, value) in self.flags() {
            if let Some(value) = value {
                body.insert(field.name().to_string(), Value::from(value));
            }
        }

        Ok(Value::Object(body))
    }

    /// Validate locally with the service's own rules before sending
    pub fn to_record(&self) -> Result<StudentRecord> {
        let body = self.to_body()?;
        StudentRecord::from_json(&body).map_err(|errors| {
            for e in &errors.errors {
                print_error(&format!("{}: {} (got {})", e.field, e.message, e.invalid_value));
            }
            anyhow::anyhow!("Record failed validation ({} errors)", errors.errors.len())
        })
    }
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

/// Send one record to the service and show its prediction
pub async fn predict(client: &ApiClient, args: &RecordArgs, format: OutputFormat) -> Result<()> {
    let record = args.to_record()?;
    let response: PredictionResponse = client.post("predict-style", &record).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            print_heading("Learning Style Prediction", 50);
            println!(
                "Predicted style:        {}",
                response.predicted_style.to_string().green().bold()
            );
            println!();

            let rows: Vec<ScoreRow> = response
                .predictions
                .iter()
                .map(|s| ScoreRow {
                    style: s.style.to_string(),
                    percentage: format_percentage(s.percentage),
                    predicted: predicted_marker(s.is_predicted),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_args() -> RecordArgs {
        RecordArgs {
            file: None,
            study_hours: Some(19),
            attendance: Some(64),
            resources: Some(1),
            extracurricular: Some(0),
            motivation: Some(0),
            internet: Some(1),
            gender: Some(0),
            age: Some(19),
            online_courses: Some(8),
            discussions: Some(1),
            assignment_completion: Some(59),
            exam_score: Some(40),
            edu_tech: Some(0),
            stress_level: Some(1),
            final_grade: Some(3),
        }
    }

    #[test]
    fn test_flags_build_record() {
        let record = full_args().to_record().unwrap();
        assert_eq!(record.study_hours, 19);
        assert_eq!(record.final_grade, 3);
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let mut from_file = serde_json::to_value(full_args().to_record().unwrap()).unwrap();
        from_file["Age"] = Value::from(30);
        std::fs::write(&path, from_file.to_string()).unwrap();

        let args = RecordArgs {
            file: Some(path),
            exam_score: Some(90),
            ..RecordArgs::default()
        };
        let record = args.to_record().unwrap();
        assert_eq!(record.age, 30);
        assert_eq!(record.exam_score, 90);
    }

    #[test]
    fn test_out_of_bounds_is_rejected_locally() {
        let args = RecordArgs {
            attendance: Some(150),
            ..full_args()
        };
        let err = args.to_record().unwrap_err();
        assert!(err.to_string().contains("1 errors"));
    }

    #[test]
    fn test_missing_fields_are_counted() {
        let args = RecordArgs {
            study_hours: Some(10),
            ..RecordArgs::default()
        };
        let err = args.to_record().unwrap_err();
        assert!(err.to_string().contains("14 errors"));
    }

    #[test]
    fn test_file_must_hold_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let args = RecordArgs {
            file: Some(path),
            ..RecordArgs::default()
        };
        assert!(args.to_body().is_err());
    }
}
