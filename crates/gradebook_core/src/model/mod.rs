//! Gradebook domain model.
//!
//! # Responsibility
//! - Define the student and grade records shared by store, services and export.
//! - Own the per-entity input validation used before any write.
//!
//! # Invariants
//! - Ids and `created_at` values are assigned by the store, never by callers.
//! - Averages are always derived from grades and never persisted.

pub mod grade;
pub mod student;
pub mod validation;
