//! Service-level error taxonomy shared by student and grade use-cases.

use crate::export::ExportError;
use crate::model::grade::GradeId;
use crate::model::student::StudentId;
use crate::model::validation::ValidationError;
use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse error class callers map to messages and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    DuplicateEmail,
    Persistence,
}

/// Error returned by every service operation.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before touching storage.
    Validation(ValidationError),
    StudentNotFound(StudentId),
    GradeNotFound(GradeId),
    /// Email already belongs to another student.
    DuplicateEmail(String),
    /// Unexpected storage failure. Never retried.
    Persistence(RepoError),
    /// CSV rendering failed.
    Export(ExportError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::StudentNotFound(_) | Self::GradeNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateEmail(_) => ErrorKind::DuplicateEmail,
            Self::Persistence(_) | Self::Export(_) => ErrorKind::Persistence,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::StudentNotFound(id) => write!(f, "student not found: {id}"),
            Self::GradeNotFound(id) => write!(f, "grade not found: {id}"),
            Self::DuplicateEmail(email) => write!(f, "email already registered: {email}"),
            Self::Persistence(err) => write!(f, "storage error: {err}"),
            Self::Export(err) => write!(f, "export error: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Export(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ExportError> for ServiceError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::StudentNotFound(id) => Self::StudentNotFound(id),
            RepoError::GradeNotFound(id) => Self::GradeNotFound(id),
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            other => Self::Persistence(other),
        }
    }
}
