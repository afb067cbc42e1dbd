//! Student domain model.
//!
//! # Responsibility
//! - Define the persisted student record and its validated write input.
//! - Provide the derived average over a student's grades.
//!
//! # Invariants
//! - `email` is unique across all students (enforced by the store).
//! - The average of a student without grades is exactly `0.0`.

use crate::model::grade::Grade;
use crate::model::validation::{validate_email, validate_name, ValidationError};
use crate::ranking::average_score;
use serde::{Deserialize, Serialize};

/// Store-assigned student identifier.
pub type StudentId = i64;

/// Persisted student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    /// Unix epoch milliseconds, set by the store on insert.
    pub created_at: i64,
}

/// Validated input for creating or replacing a student.
///
/// Only obtainable through [`StudentDraft::new`], so holding one proves the
/// name and email passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    name: String,
    email: String,
}

impl StudentDraft {
    /// Validates and normalizes raw name/email input.
    pub fn new(name: &str, email: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            name: validate_name(name)?,
            email: validate_email(email)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// A student together with all of its grades.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentGrades {
    pub student: Student,
    /// Ordered by `created_at` descending.
    pub grades: Vec<Grade>,
}

impl StudentGrades {
    /// Arithmetic mean of all scores, `0.0` when there are none.
    pub fn average(&self) -> f64 {
        let scores: Vec<f64> = self.grades.iter().map(|grade| grade.score).collect();
        average_score(&scores)
    }

    pub fn grade_count(&self) -> usize {
        self.grades.len()
    }
}
