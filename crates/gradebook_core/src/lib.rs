//! Core domain logic for the gradebook.
//! This crate is the single source of truth for student/grade invariants;
//! the CLI (and any web layer) only talk to the services exported here.

pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod ranking;
pub mod repo;
pub mod service;

pub use export::{export_grades, export_students, ExportError, ExportKind};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::grade::{Grade, GradeDraft, GradeId, GradeWithStudent};
pub use model::student::{Student, StudentDraft, StudentGrades, StudentId};
pub use model::validation::ValidationError;
pub use ranking::{average_score, compute_rankings, RankingEntry};
pub use repo::error::{RepoError, RepoResult};
pub use repo::grade_repo::{GradeRepository, SqliteGradeRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use service::error::{ErrorKind, ServiceError, ServiceResult};
pub use service::grade_service::{GradeService, GradeUpdate};
pub use service::student_service::{StudentService, StudentUpdate};
