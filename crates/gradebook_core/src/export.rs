//! CSV export of students and grades.
//!
//! # Responsibility
//! - Render student summaries and grade listings as RFC 4180 CSV text.
//! - Name the download (file name, content type) for web or CLI callers.
//!
//! # Invariants
//! - Header rows are fixed and always present, even for empty input.
//! - Student rows keep caller order; grade rows are re-sorted by student
//!   name then creation time.
//! - Quoting of delimiters, quotes and newlines is delegated to `csv`.

use crate::model::grade::GradeWithStudent;
use crate::model::student::StudentGrades;
use chrono::DateTime;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const STUDENTS_HEADER: [&str; 5] = ["ID", "Name", "Email", "Average Grade", "Number of Grades"];
pub const GRADES_HEADER: [&str; 5] = ["Grade ID", "Student Name", "Subject", "Score", "Date"];
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    /// Buffered output could not be recovered from the writer.
    Buffer(String),
    /// `created_at` is outside the representable date range.
    InvalidTimestamp(i64),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "csv write failed: {err}"),
            Self::Buffer(message) => write!(f, "csv buffer error: {message}"),
            Self::InvalidTimestamp(value) => write!(f, "invalid timestamp: {value}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Which dataset a CSV download contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Students,
    Grades,
}

impl ExportKind {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Students => "students.csv",
            Self::Grades => "grades.csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        "text/csv"
    }

    /// `Content-Disposition` value that makes browsers save the body.
    pub fn content_disposition(self) -> String {
        format!("attachment; filename={}", self.file_name())
    }
}

/// Renders one row per student with average (2 decimals) and grade count.
pub fn export_students(students: &[StudentGrades]) -> ExportResult<String> {
    let mut writer = new_writer();
    writer.write_record(STUDENTS_HEADER)?;
    for record in students {
        writer.write_record([
            record.student.id.to_string(),
            record.student.name.clone(),
            record.student.email.clone(),
            format!("{:.2}", record.average()),
            record.grade_count().to_string(),
        ])?;
    }
    finish(writer)
}

/// Renders one row per grade, ordered by student name then creation time.
pub fn export_grades(grades: &[GradeWithStudent]) -> ExportResult<String> {
    let mut ordered: Vec<&GradeWithStudent> = grades.iter().collect();
    ordered.sort_by(|left, right| {
        left.student_name
            .cmp(&right.student_name)
            .then_with(|| left.grade.created_at.cmp(&right.grade.created_at))
    });

    let mut writer = new_writer();
    writer.write_record(GRADES_HEADER)?;
    for row in ordered {
        writer.write_record([
            row.grade.id.to_string(),
            row.student_name.clone(),
            row.grade.subject.clone(),
            format_score(row.grade.score),
            format_timestamp(row.grade.created_at)?,
        ])?;
    }
    finish(writer)
}

/// Formats a score keeping at least one decimal place (`85.0`, `87.5`).
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        score.to_string()
    }
}

/// Formats epoch milliseconds as UTC `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(epoch_ms: i64) -> ExportResult<String> {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|value| value.format(DATE_FORMAT).to_string())
        .ok_or(ExportError::InvalidTimestamp(epoch_ms))
}

fn new_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> ExportResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.error().to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Buffer(err.to_string()))
}
