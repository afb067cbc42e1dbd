//! Student use-case service.
//!
//! # Responsibility
//! - Validate student input before any repository call.
//! - Expose student CRUD, rankings and the student CSV export.
//!
//! # Invariants
//! - Service APIs never write unvalidated input.
//! - Deleting an unknown id is reported as `StudentNotFound`, not success.

use crate::export::export_students;
use crate::model::student::{Student, StudentDraft, StudentGrades, StudentId};
use crate::ranking::{compute_rankings, RankingEntry};
use crate::repo::student_repo::StudentRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::{info, warn};

/// Partial student edit. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Student service facade over repository implementations.
pub struct StudentService<R: StudentRepository> {
    repo: R,
}

impl<R: StudentRepository> StudentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates input and creates a student with a unique email.
    pub fn create_student(&self, name: &str, email: &str) -> ServiceResult<Student> {
        let draft = StudentDraft::new(name, email).inspect_err(|_| {
            warn!("event=student_create module=service status=invalid");
        })?;
        let student = self.repo.create_student(&draft)?;
        info!(
            "event=student_create module=service status=ok student_id={}",
            student.id
        );
        Ok(student)
    }

    pub fn get_student(&self, id: StudentId) -> ServiceResult<Option<Student>> {
        Ok(self.repo.get_student(id)?)
    }

    /// Gets one student with grades, failing when the id is unknown.
    pub fn get_student_grades(&self, id: StudentId) -> ServiceResult<StudentGrades> {
        self.repo
            .get_student_grades(id)?
            .ok_or(ServiceError::StudentNotFound(id))
    }

    /// Lists all students ordered by name.
    pub fn list_students(&self) -> ServiceResult<Vec<Student>> {
        Ok(self.repo.list_students()?)
    }

    /// Lists all students with their grades, ordered by name.
    pub fn list_student_grades(&self) -> ServiceResult<Vec<StudentGrades>> {
        Ok(self.repo.list_student_grades()?)
    }

    /// Applies a partial edit. Unset fields keep their stored value, and the
    /// merged record is validated as a whole.
    pub fn update_student(&self, id: StudentId, update: &StudentUpdate) -> ServiceResult<Student> {
        let current = self
            .repo
            .get_student(id)?
            .ok_or(ServiceError::StudentNotFound(id))?;
        let name = update.name.as_deref().unwrap_or(&current.name);
        let email = update.email.as_deref().unwrap_or(&current.email);
        let draft = StudentDraft::new(name, email)?;

        let student = self.repo.update_student(id, &draft)?;
        info!("event=student_update module=service status=ok student_id={id}");
        Ok(student)
    }

    /// Deletes a student and all of its grades.
    pub fn delete_student(&self, id: StudentId) -> ServiceResult<()> {
        if !self.repo.delete_student(id)? {
            return Err(ServiceError::StudentNotFound(id));
        }
        info!("event=student_delete module=service status=ok student_id={id}");
        Ok(())
    }

    /// Ranks graded students by average, highest first.
    pub fn rankings(&self) -> ServiceResult<Vec<RankingEntry>> {
        let students = self.repo.list_student_grades()?;
        Ok(compute_rankings(&students))
    }

    /// Renders every student as CSV, in id (registration) order.
    pub fn export_students_csv(&self) -> ServiceResult<String> {
        let mut students = self.repo.list_student_grades()?;
        students.sort_by_key(|record| record.student.id);
        let csv = export_students(&students)?;
        info!(
            "event=export module=service status=ok kind=students rows={}",
            students.len()
        );
        Ok(csv)
    }
}
