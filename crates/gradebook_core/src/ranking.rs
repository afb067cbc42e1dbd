//! Student ranking by average grade.
//!
//! # Invariants
//! - Students whose average is exactly `0.0` are not ranked. This also drops
//!   a student whose only grades are zeros.
//! - Output is sorted by average descending, then name ascending, then id.

use crate::model::student::{Student, StudentGrades};
use serde::Serialize;
use std::cmp::Ordering;

/// One ranked student. The 1-based rank is the entry's index + 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub student: Student,
    pub average: f64,
}

/// Arithmetic mean of `scores`, `0.0` for an empty slice.
pub fn average_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Ranks students by average grade, highest first.
pub fn compute_rankings(students: &[StudentGrades]) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = students
        .iter()
        .map(|record| RankingEntry {
            student: record.student.clone(),
            average: record.average(),
        })
        .filter(|entry| entry.average != 0.0)
        .collect();

    entries.sort_by(|left, right| {
        right
            .average
            .partial_cmp(&left.average)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.student.name.cmp(&right.student.name))
            .then_with(|| left.student.id.cmp(&right.student.id))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::{average_score, compute_rankings};
    use crate::model::grade::Grade;
    use crate::model::student::{Student, StudentGrades};

    fn record(id: i64, name: &str, scores: &[f64]) -> StudentGrades {
        StudentGrades {
            student: Student {
                id,
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                created_at: 0,
            },
            grades: scores
                .iter()
                .enumerate()
                .map(|(index, score)| Grade {
                    id: id * 100 + index as i64,
                    student_id: id,
                    subject: "Math".to_string(),
                    score: *score,
                    created_at: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(average_score(&[]), 0.0);
        assert_eq!(average_score(&[85.0, 90.0]), 87.5);
    }

    #[test]
    fn rankings_sort_descending_and_skip_ungraded() {
        let students = vec![
            record(1, "Bob", &[85.0]),
            record(2, "Carol", &[]),
            record(3, "Alice", &[95.0, 90.0]),
        ];

        let ranked = compute_rankings(&students);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].student.name, "Alice");
        assert_eq!(ranked[0].average, 92.5);
        assert_eq!(ranked[1].student.name, "Bob");
        assert_eq!(ranked[1].average, 85.0);
    }

    #[test]
    fn rankings_break_ties_by_name_then_id() {
        let students = vec![
            record(4, "Zed", &[80.0]),
            record(2, "Amy", &[80.0]),
            record(1, "Amy", &[80.0]),
        ];

        let ids: Vec<i64> = compute_rankings(&students)
            .iter()
            .map(|entry| entry.student.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn rankings_exclude_all_zero_scores() {
        let students = vec![record(1, "Zero", &[0.0]), record(2, "One", &[1.0])];
        let ranked = compute_rankings(&students);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].student.name, "One");
    }
}
