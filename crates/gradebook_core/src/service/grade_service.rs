//! Grade use-case service.
//!
//! # Responsibility
//! - Validate subject and score before any repository call.
//! - Expose grade CRUD and the grade CSV export.
//!
//! # Invariants
//! - Scores outside `[0, 100]` never reach storage.
//! - Listing grades of an unknown student is `StudentNotFound`, not an
//!   empty list.

use crate::export::export_grades;
use crate::model::grade::{Grade, GradeDraft, GradeId};
use crate::model::student::StudentId;
use crate::repo::grade_repo::GradeRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::info;

/// Partial grade edit. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeUpdate {
    pub subject: Option<String>,
    pub score: Option<f64>,
}

/// Grade service facade over repository implementations.
pub struct GradeService<R: GradeRepository> {
    repo: R,
}

impl<R: GradeRepository> GradeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates input and records a grade for an existing student.
    pub fn create_grade(
        &self,
        student_id: StudentId,
        subject: &str,
        score: f64,
    ) -> ServiceResult<Grade> {
        let draft = GradeDraft::new(student_id, subject, score)?;
        let grade = self.repo.create_grade(&draft)?;
        info!(
            "event=grade_create module=service status=ok grade_id={} student_id={student_id}",
            grade.id
        );
        Ok(grade)
    }

    pub fn get_grade(&self, id: GradeId) -> ServiceResult<Option<Grade>> {
        Ok(self.repo.get_grade(id)?)
    }

    /// Lists a student's grades, newest first.
    pub fn list_grades_by_student(&self, student_id: StudentId) -> ServiceResult<Vec<Grade>> {
        if !self.repo.student_exists(student_id)? {
            return Err(ServiceError::StudentNotFound(student_id));
        }
        Ok(self.repo.list_grades_by_student(student_id)?)
    }

    /// Applies a partial edit and re-validates the merged grade.
    pub fn update_grade(&self, id: GradeId, update: &GradeUpdate) -> ServiceResult<Grade> {
        let current = self
            .repo
            .get_grade(id)?
            .ok_or(ServiceError::GradeNotFound(id))?;
        let subject = update.subject.as_deref().unwrap_or(&current.subject);
        let score = update.score.unwrap_or(current.score);
        let draft = GradeDraft::new(current.student_id, subject, score)?;

        let grade = self.repo.update_grade(id, &draft)?;
        info!("event=grade_update module=service status=ok grade_id={id}");
        Ok(grade)
    }

    /// Deletes one grade; the owner's average is recomputed on next read.
    pub fn delete_grade(&self, id: GradeId) -> ServiceResult<()> {
        if !self.repo.delete_grade(id)? {
            return Err(ServiceError::GradeNotFound(id));
        }
        info!("event=grade_delete module=service status=ok grade_id={id}");
        Ok(())
    }

    /// Renders all grades as CSV, ordered by student name then date.
    pub fn export_grades_csv(&self) -> ServiceResult<String> {
        let rows = self.repo.list_grades_with_students()?;
        let csv = export_grades(&rows)?;
        info!(
            "event=export module=service status=ok kind=grades rows={}",
            rows.len()
        );
        Ok(csv)
    }
}
