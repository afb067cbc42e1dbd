//! Field-level input validation.
//!
//! # Responsibility
//! - Reject blank, malformed or out-of-range input before it reaches storage.
//! - Return normalized (trimmed) values so stored data is canonical.
//!
//! # Invariants
//! - Scores are rejected, never clamped.
//! - Validation is pure: no I/O, no uniqueness checks.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lowest accepted grade score (inclusive).
pub const MIN_SCORE: f64 = 0.0;
/// Highest accepted grade score (inclusive).
pub const MAX_SCORE: f64 = 100.0;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Input rejected before persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Student name is empty after trim.
    BlankName,
    /// Student email is empty after trim.
    BlankEmail,
    /// Email is not shaped like `local@domain`.
    InvalidEmail(String),
    /// Grade subject is empty after trim.
    BlankSubject,
    /// Score is NaN/infinite or outside `[MIN_SCORE, MAX_SCORE]`.
    ScoreOutOfRange(f64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "name must not be blank"),
            Self::BlankEmail => write!(f, "email must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::BlankSubject => write!(f, "subject must not be blank"),
            Self::ScoreOutOfRange(score) => write!(
                f,
                "score {score} is out of range; expected {MIN_SCORE}..={MAX_SCORE}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Trims and checks a student name.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}

/// Trims and checks a student email address.
///
/// Requires exactly one `@` with non-empty local and domain parts and no
/// embedded whitespace.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankEmail);
    }
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidEmail(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trims and checks a grade subject.
pub fn validate_subject(subject: &str) -> Result<String, ValidationError> {
    let trimmed = subject.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankSubject);
    }
    Ok(trimmed.to_string())
}

/// Checks that a score is finite and within the inclusive range.
pub fn validate_score(score: f64) -> Result<f64, ValidationError> {
    if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(ValidationError::ScoreOutOfRange(score));
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::{validate_email, validate_name, validate_score, validate_subject, ValidationError};

    #[test]
    fn name_is_trimmed_and_blank_rejected() {
        assert_eq!(validate_name("  Alice ").unwrap(), "Alice");
        assert_eq!(validate_name(" \t "), Err(ValidationError::BlankName));
    }

    #[test]
    fn email_requires_local_and_domain_parts() {
        assert_eq!(
            validate_email(" alice@example.com ").unwrap(),
            "alice@example.com"
        );
        assert_eq!(validate_email(""), Err(ValidationError::BlankEmail));
        for bad in ["alice", "@example.com", "alice@", "a@b@c", "al ice@example.com"] {
            assert!(
                matches!(validate_email(bad), Err(ValidationError::InvalidEmail(_))),
                "`{bad}` should be rejected"
            );
        }
    }

    #[test]
    fn subject_blank_rejected() {
        assert_eq!(validate_subject(" Math ").unwrap(), "Math");
        assert_eq!(validate_subject("   "), Err(ValidationError::BlankSubject));
    }

    #[test]
    fn score_bounds_are_inclusive() {
        assert_eq!(validate_score(0.0).unwrap(), 0.0);
        assert_eq!(validate_score(100.0).unwrap(), 100.0);
        assert!(validate_score(150.0).is_err());
        assert!(validate_score(-10.0).is_err());
        assert!(validate_score(f64::NAN).is_err());
        assert!(validate_score(f64::INFINITY).is_err());
    }
}
