//! Grade domain model.
//!
//! # Invariants
//! - Every grade belongs to exactly one live student.
//! - `score` is within `[MIN_SCORE, MAX_SCORE]` once persisted.

use crate::model::student::StudentId;
use crate::model::validation::{validate_score, validate_subject, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned grade identifier.
pub type GradeId = i64;

/// Persisted grade record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub student_id: StudentId,
    pub subject: String,
    pub score: f64,
    /// Unix epoch milliseconds, set by the store on insert.
    pub created_at: i64,
}

/// Validated input for creating a grade.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeDraft {
    student_id: StudentId,
    subject: String,
    score: f64,
}

impl GradeDraft {
    /// Validates subject and score for a grade owned by `student_id`.
    ///
    /// Does not check that the student exists; the store does that inside
    /// the insert transaction.
    pub fn new(student_id: StudentId, subject: &str, score: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            student_id,
            subject: validate_subject(subject)?,
            score: validate_score(score)?,
        })
    }

    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Grade joined with its owner's name, used by the grade export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeWithStudent {
    pub grade: Grade,
    pub student_name: String,
}
