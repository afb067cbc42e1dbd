//! Shared repository error type and connection readiness checks.
//!
//! # Invariants
//! - Repositories are only constructed over fully migrated connections.
//! - Email `UNIQUE` violations always surface as `DuplicateEmail`, even when
//!   they slip past the in-transaction check.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::grade::GradeId;
use crate::model::student::StudentId;
use rusqlite::{ffi, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for student/grade persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite failure (generic persistence error).
    Db(DbError),
    /// Student id does not resolve.
    StudentNotFound(StudentId),
    /// Grade id does not resolve.
    GradeNotFound(GradeId),
    /// Email is already held by another student.
    DuplicateEmail(String),
    /// Connection schema version does not match this binary.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::StudentNotFound(id) => write!(f, "no student with id {id}"),
            Self::GradeNotFound(id) => write!(f, "no grade with id {id}"),
            Self::DuplicateEmail(email) => write!(f, "email `{email}` is already in use"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is at schema version {actual_version}, repositories need {expected_version}; open it with `db::open_db`"
            ),
            Self::MissingRequiredTable(table) => write!(f, "table `{table}` is missing"),
            Self::InvalidData(message) => write!(f, "stored data is inconsistent: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Converts a write error, mapping an email `UNIQUE` violation to
/// `DuplicateEmail`.
pub(crate) fn map_email_conflict(err: rusqlite::Error, email: &str) -> RepoError {
    if is_unique_violation(&err) {
        RepoError::DuplicateEmail(email.to_string())
    } else {
        err.into()
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

const REQUIRED_TABLES: [&str; 2] = ["students", "grades"];

/// Accepts only connections prepared by `db::open_db*`: current schema
/// version and both gradebook tables present.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;")?;
    for table in REQUIRED_TABLES {
        if !stmt.exists([table])? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
