//! Core use-case services.
//!
//! # Responsibility
//! - Validate caller input, then orchestrate repository calls.
//! - Keep CLI/web layers decoupled from storage details.
//! - Map repository failures onto one caller-facing error taxonomy.

pub mod error;
pub mod grade_service;
pub mod student_service;
