//! Core data models for learning style detection
//!
//! The field table here is the schema for every student record: the
//! request parser, the dataset loader, and the encoder all resolve columns
//! through [`Field`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Input fields of a student record, in the service's canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    StudyHours,
    Attendance,
    Resources,
    Extracurricular,
    Motivation,
    Internet,
    Gender,
    Age,
    OnlineCourses,
    Discussions,
    AssignmentCompletion,
    ExamScore,
    EduTech,
    StressLevel,
    FinalGrade,
}

impl Field {
    /// All fields in canonical request order
    pub const ALL: [Field; 15] = [
        Field::StudyHours,
        Field::Attendance,
        Field::Resources,
        Field::Extracurricular,
        Field::Motivation,
        Field::Internet,
        Field::Gender,
        Field::Age,
        Field::OnlineCourses,
        Field::Discussions,
        Field::AssignmentCompletion,
        Field::ExamScore,
        Field::EduTech,
        Field::StressLevel,
        Field::FinalGrade,
    ];

    /// Wire name used in JSON bodies and dataset headers
    pub fn name(self) -> &'static str {
        match self {
            Field::StudyHours => "StudyHours",
            Field::Attendance => "Attendance",
            Field::Resources => "Resources",
            Field::Extracurricular => "Extracurricular",
            Field::Motivation => "Motivation",
            Field::Internet => "Internet",
            Field::Gender => "Gender",
            Field::Age => "Age",
            Field::OnlineCourses => "OnlineCourses",
            Field::Discussions => "Discussions",
            Field::AssignmentCompletion => "AssignmentCompletion",
            Field::ExamScore => "ExamScore",
            Field::EduTech => "EduTech",
            Field::StressLevel => "StressLevel",
            Field::FinalGrade => "FinalGrade",
        }
    }

    /// Inclusive (min, max) bounds
    pub fn bounds(self) -> (i64, i64) {
        match self {
            Field::StudyHours => (0, 100),
            Field::Attendance => (0, 100),
            Field::Resources => (0, 10),
            Field::Extracurricular => (0, 1),
            Field::Motivation => (0, 2),
            Field::Internet => (0, 1),
            Field::Gender => (0, 1),
            Field::Age => (10, 100),
            Field::OnlineCourses => (0, 50),
            Field::Discussions => (0, 10),
            Field::AssignmentCompletion => (0, 100),
            Field::ExamScore => (0, 100),
            Field::EduTech => (0, 1),
            Field::StressLevel => (0, 10),
            Field::FinalGrade => (0, 10),
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Check a value against this field's bounds
    pub fn check(self, value: i64) -> Option<FieldError> {
        let (min, max) = self.bounds();
        if value < min {
            Some(FieldError::new(
                self.name(),
                format!("Input should be greater than or equal to {}", min),
                Value::from(value),
            ))
        } else if value > max {
            Some(FieldError::new(
                self.name(),
                format!("Input should be less than or equal to {}", max),
                Value::from(value),
            ))
        } else {
            None
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One observation of student behavior and performance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StudentRecord {
    pub study_hours: i64,
    pub attendance: i64,
    pub resources: i64,
    pub extracurricular: i64,
    pub motivation: i64,
    pub internet: i64,
    pub gender: i64,
    pub age: i64,
    pub online_courses: i64,
    pub discussions: i64,
    pub assignment_completion: i64,
    pub exam_score: i64,
    pub edu_tech: i64,
    pub stress_level: i64,
    pub final_grade: i64,
}

impl StudentRecord {
    pub fn get(&self, field: Field) -> i64 {
        match field {
            Field::StudyHours => self.study_hours,
            Field::Attendance => self.attendance,
            Field::Resources => self.resources,
            Field::Extracurricular => self.extracurricular,
            Field::Motivation => self.motivation,
            Field::Internet => self.internet,
            Field::Gender => self.gender,
            Field::Age => self.age,
            Field::OnlineCourses => self.online_courses,
            Field::Discussions => self.discussions,
            Field::AssignmentCompletion => self.assignment_completion,
            Field::ExamScore => self.exam_score,
            Field::EduTech => self.edu_tech,
            Field::StressLevel => self.stress_level,
            Field::FinalGrade => self.final_grade,
        }
    }

    pub fn set(&mut self, field: Field, value: i64) {
        let slot = match field {
            Field::StudyHours => &mut self.study_hours,
            Field::Attendance => &mut self.attendance,
            Field::Resources => &mut self.resources,
            Field::Extracurricular => &mut self.extracurricular,
            Field::Motivation => &mut self.motivation,
            Field::Internet => &mut self.internet,
            Field::Gender => &mut self.gender,
            Field::Age => &mut self.age,
            Field::OnlineCourses => &mut self.online_courses,
            Field::Discussions => &mut self.discussions,
            Field::AssignmentCompletion => &mut self.assignment_completion,
            Field::ExamScore => &mut self.exam_score,
            Field::EduTech => &mut self.edu_tech,
            Field::StressLevel => &mut self.stress_level,
            Field::FinalGrade => &mut self.final_grade,
        };
        *slot = value;
    }

    /// Check every field against its bounds, reporting all violations
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let errors: Vec<FieldError> = Field::ALL
            .iter()
            .filter_map(|&field| field.check(self.get(field)))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }

    /// Parse and validate a request body.
    ///
    /// Every missing, mistyped, or out-of-bound field produces its own
    /// [`FieldError`]; parsing never stops at the first problem.
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let Some(object) = body.as_object() else {
            return Err(ValidationErrors {
                errors: vec![FieldError::new(
                    "body",
                    "Input should be a valid dictionary",
                    body.clone(),
                )],
            });
        };

        let mut record = StudentRecord::default();
        let mut errors = Vec::new();

        for field in Field::ALL {
            match object.get(field.name()) {
                None => errors.push(FieldError::new(
                    field.name(),
                    "Field required",
                    Value::from("N/A"),
                )),
                Some(raw) => match coerce_integer(raw) {
                    None => errors.push(FieldError::new(
                        field.name(),
                        "Input should be a valid integer",
                        raw.clone(),
                    )),
                    Some(value) => match field.check(value) {
                        Some(mut err) => {
                            err.invalid_value = raw.clone();
                            errors.push(err);
                        }
                        None => record.set(field, value),
                    },
                },
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(ValidationErrors { errors })
        }
    }
}

/// Lax integer coercion: integers, integral floats, and numeric strings
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// A single field validation failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub invalid_value: Value,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, invalid_value: Value) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            invalid_value,
        }
    }
}

/// All validation failures for one record
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn contains_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Learning style labels in fixed class order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
    #[serde(rename = "Reading/Writing")]
    ReadingWriting,
}

impl LearningStyle {
    pub const COUNT: usize = 4;

    pub const ALL: [LearningStyle; 4] = [
        LearningStyle::Visual,
        LearningStyle::Auditory,
        LearningStyle::Kinesthetic,
        LearningStyle::ReadingWriting,
    ];

    /// Integer class code used by the classifier
    pub fn code(self) -> usize {
        self as usize
    }

    pub fn from_code(code: usize) -> Option<Self> {
        Self::ALL.get(code).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            LearningStyle::Visual => "Visual",
            LearningStyle::Auditory => "Auditory",
            LearningStyle::Kinesthetic => "Kinesthetic",
            LearningStyle::ReadingWriting => "Reading/Writing",
        }
    }

    /// Parse an integer code or a class name (case-insensitive)
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(code) = raw.parse::<usize>() {
            return Self::from_code(code);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_body() -> Value {
        json!({
            "StudyHours": 19,
            "Attendance": 64,
            "Resources": 1,
            "Extracurricular": 0,
            "Motivation": 0,
            "Internet": 1,
            "Gender": 0,
            "Age": 19,
            "OnlineCourses": 8,
            "Discussions": 1,
            "AssignmentCompletion": 59,
            "ExamScore": 40,
            "EduTech": 0,
            "StressLevel": 1,
            "FinalGrade": 3
        })
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::from_name("LearningStyle"), None);
    }

    #[test]
    fn test_from_json_valid_record() {
        let record = StudentRecord::from_json(&sample_body()).unwrap();
        assert_eq!(record.study_hours, 19);
        assert_eq!(record.attendance, 64);
        assert_eq!(record.age, 19);
        assert_eq!(record.final_grade, 3);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_out_of_bound_attendance_rejected() {
        let mut body = sample_body();
        body["Attendance"] = json!(150);

        let err = StudentRecord::from_json(&body).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "Attendance");
        assert_eq!(err.errors[0].invalid_value, json!(150));
        assert!(err.errors[0].message.contains("less than or equal to 100"));
    }

    #[test]
    fn test_all_problems_reported() {
        let body = json!({
            "StudyHours": "lots",
            "Age": 5,
            "Attendance": 50
        });

        let err = StudentRecord::from_json(&body).unwrap_err();
        // 12 missing + 1 mistyped + 1 below minimum
        assert_eq!(err.errors.len(), 14);
        assert!(err.contains_field("StudyHours"));
        assert!(err.contains_field("Age"));
        assert!(!err.contains_field("Attendance"));

        let age = err.errors.iter().find(|e| e.field == "Age").unwrap();
        assert!(age.message.contains("greater than or equal to 10"));
    }

    #[test]
    fn test_lax_integer_coercion() {
        let mut body = sample_body();
        body["StudyHours"] = json!("19");
        body["Attendance"] = json!(64.0);
        assert!(StudentRecord::from_json(&body).is_ok());

        body["Attendance"] = json!(64.5);
        let err = StudentRecord::from_json(&body).unwrap_err();
        assert_eq!(err.errors[0].message, "Input should be a valid integer");

        body["Attendance"] = json!(true);
        assert!(StudentRecord::from_json(&body).is_err());
    }

    #[test]
    fn test_non_object_body() {
        let err = StudentRecord::from_json(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "body");
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let record = StudentRecord::from_json(&sample_body()).unwrap();
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value["AssignmentCompletion"], 59);
        assert_eq!(value["EduTech"], 0);
        assert_eq!(value, sample_body());
    }

    #[test]
    fn test_learning_style_codes() {
        assert_eq!(LearningStyle::from_code(0), Some(LearningStyle::Visual));
        assert_eq!(LearningStyle::from_code(3), Some(LearningStyle::ReadingWriting));
        assert_eq!(LearningStyle::from_code(4), None);
        assert_eq!(LearningStyle::parse("2"), Some(LearningStyle::Kinesthetic));
        assert_eq!(
            LearningStyle::parse("reading/writing"),
            Some(LearningStyle::ReadingWriting)
        );
        assert_eq!(LearningStyle::parse("Tactile"), None);
        assert_eq!(
            serde_json::to_value(LearningStyle::ReadingWriting).unwrap(),
            "Reading/Writing"
        );
    }
}
