//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `students` table.
//! - Load students together with their grades for ranking and export.
//!
//! # Invariants
//! - Email uniqueness check and write run inside one immediate transaction.
//! - Deleting a student removes its grades in the same transaction.
//! - `list_students` is ordered by `name ASC, id ASC`.

use crate::model::grade::Grade;
use crate::model::student::{Student, StudentDraft, StudentGrades, StudentId};
use crate::repo::error::{ensure_connection_ready, map_email_conflict, RepoError, RepoResult};
use crate::repo::grade_repo::{parse_grade_row, GRADE_SELECT_SQL};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;

const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    created_at
FROM students";

/// Repository interface for student operations.
pub trait StudentRepository {
    /// Inserts a student after checking the email is free.
    fn create_student(&self, draft: &StudentDraft) -> RepoResult<Student>;
    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Lists all students ordered by name.
    fn list_students(&self) -> RepoResult<Vec<Student>>;
    /// Replaces name and email; the uniqueness check ignores `id` itself.
    fn update_student(&self, id: StudentId, draft: &StudentDraft) -> RepoResult<Student>;
    /// Deletes a student and all of its grades. Returns `false` when absent.
    fn delete_student(&self, id: StudentId) -> RepoResult<bool>;
    /// Loads one student with its grades (newest first).
    fn get_student_grades(&self, id: StudentId) -> RepoResult<Option<StudentGrades>>;
    /// Loads every student with its grades, ordered like `list_students`.
    fn list_student_grades(&self) -> RepoResult<Vec<StudentGrades>>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create_student(&self, draft: &StudentDraft) -> RepoResult<Student> {
        let tx = self.begin()?;
        if email_taken(&tx, draft.email(), None)? {
            debug!("event=student_create module=repo status=rejected reason=duplicate_email");
            return Err(RepoError::DuplicateEmail(draft.email().to_string()));
        }

        tx.execute(
            "INSERT INTO students (name, email) VALUES (?1, ?2);",
            params![draft.name(), draft.email()],
        )
        .map_err(|err| map_email_conflict(err, draft.email()))?;
        let id = tx.last_insert_rowid();
        let student = load_student(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("student {id} missing after insert"))
        })?;
        tx.commit()?;

        info!("event=student_create module=repo status=ok student_id={id}");
        Ok(student)
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>> {
        load_student(self.conn, id)
    }

    fn list_students(&self) -> RepoResult<Vec<Student>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let students = stmt
            .query_map([], parse_student_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    fn update_student(&self, id: StudentId, draft: &StudentDraft) -> RepoResult<Student> {
        let tx = self.begin()?;
        if load_student(&tx, id)?.is_none() {
            return Err(RepoError::StudentNotFound(id));
        }
        if email_taken(&tx, draft.email(), Some(id))? {
            debug!(
                "event=student_update module=repo status=rejected reason=duplicate_email student_id={id}"
            );
            return Err(RepoError::DuplicateEmail(draft.email().to_string()));
        }

        tx.execute(
            "UPDATE students SET name = ?1, email = ?2 WHERE id = ?3;",
            params![draft.name(), draft.email(), id],
        )
        .map_err(|err| map_email_conflict(err, draft.email()))?;
        let student = load_student(&tx, id)?.ok_or(RepoError::StudentNotFound(id))?;
        tx.commit()?;

        info!("event=student_update module=repo status=ok student_id={id}");
        Ok(student)
    }

    fn delete_student(&self, id: StudentId) -> RepoResult<bool> {
        let tx = self.begin()?;
        // Must not depend on `foreign_keys=ON` being set by the caller.
        let grades_removed = tx.execute("DELETE FROM grades WHERE student_id = ?1;", [id])?;
        let removed = tx.execute("DELETE FROM students WHERE id = ?1;", [id])?;
        if removed == 0 {
            // Nothing to commit; dropping the transaction rolls back.
            return Ok(false);
        }
        tx.commit()?;

        info!(
            "event=student_delete module=repo status=ok student_id={id} grades_removed={grades_removed}"
        );
        Ok(true)
    }

    fn get_student_grades(&self, id: StudentId) -> RepoResult<Option<StudentGrades>> {
        let Some(student) = load_student(self.conn, id)? else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(&format!(
            "{GRADE_SELECT_SQL}
             WHERE student_id = ?1
             ORDER BY created_at DESC, id DESC;"
        ))?;
        let grades = stmt
            .query_map([id], parse_grade_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(StudentGrades { student, grades }))
    }

    fn list_student_grades(&self) -> RepoResult<Vec<StudentGrades>> {
        let students = self.list_students()?;

        let mut stmt = self.conn.prepare(&format!(
            "{GRADE_SELECT_SQL} ORDER BY student_id ASC, created_at DESC, id DESC;"
        ))?;
        let mut by_student: HashMap<StudentId, Vec<Grade>> = HashMap::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let grade = parse_grade_row(row)?;
            by_student.entry(grade.student_id).or_default().push(grade);
        }

        Ok(students
            .into_iter()
            .map(|student| {
                let grades = by_student.remove(&student.id).unwrap_or_default();
                StudentGrades { student, grades }
            })
            .collect())
    }
}

fn load_student(conn: &Connection, id: StudentId) -> RepoResult<Option<Student>> {
    let student = conn
        .query_row(
            &format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_student_row,
        )
        .optional()?;
    Ok(student)
}

fn email_taken(conn: &Connection, email: &str, exclude: Option<StudentId>) -> RepoResult<bool> {
    let taken: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM students
            WHERE email = ?1
              AND (?2 IS NULL OR id <> ?2)
        );",
        params![email, exclude],
        |row| row.get(0),
    )?;
    Ok(taken == 1)
}

fn parse_student_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}
