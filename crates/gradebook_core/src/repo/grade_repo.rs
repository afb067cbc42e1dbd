//! Grade repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `grades` table.
//! - Provide the joined grade/student listing used by CSV export.
//!
//! # Invariants
//! - A grade is only inserted when its owner exists, checked in the insert
//!   transaction.
//! - Per-student listing is ordered by `created_at DESC, id DESC`.

use crate::model::grade::{Grade, GradeDraft, GradeId, GradeWithStudent};
use crate::model::student::StudentId;
use crate::repo::error::{ensure_connection_ready, RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

pub(crate) const GRADE_SELECT_SQL: &str = "SELECT
    id,
    student_id,
    subject,
    score,
    created_at
FROM grades";

/// Repository interface for grade operations.
pub trait GradeRepository {
    /// Inserts a grade for an existing student.
    fn create_grade(&self, draft: &GradeDraft) -> RepoResult<Grade>;
    fn get_grade(&self, id: GradeId) -> RepoResult<Option<Grade>>;
    /// Lists one student's grades, newest first. Unknown students yield an
    /// empty list.
    fn list_grades_by_student(&self, student_id: StudentId) -> RepoResult<Vec<Grade>>;
    /// Replaces subject and score. The owning student never changes.
    fn update_grade(&self, id: GradeId, draft: &GradeDraft) -> RepoResult<Grade>;
    /// Deletes one grade. Returns `false` when absent.
    fn delete_grade(&self, id: GradeId) -> RepoResult<bool>;
    /// Lists all grades with owner names, ordered by student name then
    /// creation time ascending.
    fn list_grades_with_students(&self) -> RepoResult<Vec<GradeWithStudent>>;
    fn student_exists(&self, student_id: StudentId) -> RepoResult<bool>;
}

/// SQLite-backed grade repository.
pub struct SqliteGradeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGradeRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl GradeRepository for SqliteGradeRepository<'_> {
    fn create_grade(&self, draft: &GradeDraft) -> RepoResult<Grade> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !student_exists(&tx, draft.student_id())? {
            return Err(RepoError::StudentNotFound(draft.student_id()));
        }

        tx.execute(
            "INSERT INTO grades (student_id, subject, score) VALUES (?1, ?2, ?3);",
            params![draft.student_id(), draft.subject(), draft.score()],
        )?;
        let id = tx.last_insert_rowid();
        let grade = load_grade(&tx, id)?
            .ok_or_else(|| RepoError::InvalidData(format!("grade {id} missing after insert")))?;
        tx.commit()?;

        info!(
            "event=grade_create module=repo status=ok grade_id={id} student_id={}",
            grade.student_id
        );
        Ok(grade)
    }

    fn get_grade(&self, id: GradeId) -> RepoResult<Option<Grade>> {
        load_grade(self.conn, id)
    }

    fn list_grades_by_student(&self, student_id: StudentId) -> RepoResult<Vec<Grade>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GRADE_SELECT_SQL}
             WHERE student_id = ?1
             ORDER BY created_at DESC, id DESC;"
        ))?;
        let grades = stmt
            .query_map([student_id], parse_grade_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(grades)
    }

    fn update_grade(&self, id: GradeId, draft: &GradeDraft) -> RepoResult<Grade> {
        let changed = self.conn.execute(
            "UPDATE grades SET subject = ?1, score = ?2 WHERE id = ?3;",
            params![draft.subject(), draft.score(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::GradeNotFound(id));
        }

        info!("event=grade_update module=repo status=ok grade_id={id}");
        load_grade(self.conn, id)?.ok_or(RepoError::GradeNotFound(id))
    }

    fn delete_grade(&self, id: GradeId) -> RepoResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM grades WHERE id = ?1;", [id])?;
        if removed > 0 {
            info!("event=grade_delete module=repo status=ok grade_id={id}");
        }
        Ok(removed > 0)
    }

    fn list_grades_with_students(&self) -> RepoResult<Vec<GradeWithStudent>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                g.id,
                g.student_id,
                g.subject,
                g.score,
                g.created_at,
                s.name AS student_name
             FROM grades g
             INNER JOIN students s ON s.id = g.student_id
             ORDER BY s.name ASC, g.created_at ASC, g.id ASC;",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(GradeWithStudent {
                    grade: parse_grade_row(row)?,
                    student_name: row.get("student_name")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn student_exists(&self, student_id: StudentId) -> RepoResult<bool> {
        student_exists(self.conn, student_id)
    }
}

fn load_grade(conn: &Connection, id: GradeId) -> RepoResult<Option<Grade>> {
    let grade = conn
        .query_row(
            &format!("{GRADE_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_grade_row,
        )
        .optional()?;
    Ok(grade)
}

fn student_exists(conn: &Connection, student_id: StudentId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM students WHERE id = ?1);",
        [student_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_grade_row(row: &Row<'_>) -> rusqlite::Result<Grade> {
    Ok(Grade {
        id: row.get("id")?,
        student_id: row.get("student_id")?,
        subject: row.get("subject")?,
        score: row.get("score")?,
        created_at: row.get("created_at")?,
    })
}
