//! Learning style detection library
//!
//! This crate provides the core functionality for:
//! - Student record schema and validation
//! - Feature encoding and random forest classification
//! - Offline training with multi-run model selection
//! - Artifact persistence and request-time inference
//! - Prediction storage and lookup
//! - Health checks and observability

pub mod artifacts;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod store;
pub mod training;

pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{InferenceContext, PredictionResponse, StylePrediction, TrainedModel};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{LearningStyle, StudentRecord};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// The reference record used by the manual API checks
    pub fn sample_record() -> StudentRecord {
        StudentRecord {
            study_hours: 19,
            attendance: 64,
            resources: 1,
            extracurricular: 0,
            motivation: 0,
            internet: 1,
            gender: 0,
            age: 19,
            online_courses: 8,
            discussions: 1,
            assignment_completion: 59,
            exam_score: 40,
            edu_tech: 0,
            stress_level: 1,
            final_grade: 3,
        }
    }

    /// Deterministic in-bounds records whose label follows study hours
    pub fn synthetic_dataset(n: usize, seed: u64) -> (Vec<StudentRecord>, Vec<LearningStyle>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut records = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);

        for i in 0..n {
            let code = i % LearningStyle::COUNT;
            let record = StudentRecord {
                study_hours: code as i64 * 25 + rng.gen_range(0..20),
                attendance: rng.gen_range(50..=100),
                resources: rng.gen_range(0..=10),
                extracurricular: rng.gen_range(0..=1),
                motivation: rng.gen_range(0..=2),
                internet: rng.gen_range(0..=1),
                gender: rng.gen_range(0..=1),
                age: rng.gen_range(18..=30),
                online_courses: rng.gen_range(0..=20),
                discussions: rng.gen_range(0..=10),
                assignment_completion: rng.gen_range(50..=100),
                exam_score: rng.gen_range(40..=100),
                edu_tech: rng.gen_range(0..=1),
                stress_level: rng.gen_range(0..=10),
                final_grade: rng.gen_range(0..=10),
            };
            records.push(record);
            labels.push(LearningStyle::ALL[code]);
        }

        (records, labels)
    }

    /// Render records and labels as a dataset CSV
    pub fn to_csv(records: &[StudentRecord], labels: &[LearningStyle]) -> String {
        let mut out = String::from(
            "StudyHours,Attendance,Resources,Extracurricular,Motivation,Internet,Gender,Age,\
             OnlineCourses,Discussions,AssignmentCompletion,ExamScore,EduTech,StressLevel,\
             FinalGrade,LearningStyle\n",
        );
        for (r, l) in records.iter().zip(labels) {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                r.study_hours,
                r.attendance,
                r.resources,
                r.extracurricular,
                r.motivation,
                r.internet,
                r.gender,
                r.age,
                r.online_courses,
                r.discussions,
                r.assignment_completion,
                r.exam_score,
                r.edu_tech,
                r.stress_level,
                r.final_grade,
                l.code()
            ));
        }
        out
    }
}
