//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for students and grades.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories trust validated drafts; input validation lives in `model`.
//! - Repository APIs return semantic errors (`StudentNotFound`,
//!   `DuplicateEmail`) in addition to DB transport errors.

pub mod error;
pub mod grade_repo;
pub mod student_repo;
