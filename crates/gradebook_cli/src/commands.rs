//! Command handlers behind the `gradebook` subcommands.
//!
//! Handlers write to injected output/input streams so they can be driven by
//! tests without a terminal.

use crate::Command;
use anyhow::{Context, Result};
use gradebook_core::export::format_score;
use gradebook_core::{
    ExportKind, Grade, GradeService, GradeUpdate, RankingEntry, ServiceError,
    SqliteGradeRepository, SqliteStudentRepository, StudentGrades, StudentService, StudentUpdate,
};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 80;

type Students<'conn> = StudentService<SqliteStudentRepository<'conn>>;
type Grades<'conn> = GradeService<SqliteGradeRepository<'conn>>;

#[derive(Debug, Serialize)]
struct StudentRow<'a> {
    id: i64,
    name: &'a str,
    email: &'a str,
    average: f64,
    grade_count: usize,
}

impl<'a> From<&'a StudentGrades> for StudentRow<'a> {
    fn from(record: &'a StudentGrades) -> Self {
        Self {
            id: record.student.id,
            name: &record.student.name,
            email: &record.student.email,
            average: record.average(),
            grade_count: record.grade_count(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StudentDetail<'a> {
    #[serde(flatten)]
    summary: StudentRow<'a>,
    grades: &'a [Grade],
}

#[derive(Debug, Serialize)]
struct RankingRow<'a> {
    rank: usize,
    id: i64,
    name: &'a str,
    average: f64,
}

/// Runs one parsed command against an open, migrated connection.
pub fn execute(
    command: &Command,
    conn: &Connection,
    json: bool,
    out: &mut impl Write,
    input: &mut impl BufRead,
) -> Result<()> {
    let students: Students<'_> = StudentService::new(SqliteStudentRepository::try_new(conn)?);
    let grades: Grades<'_> = GradeService::new(SqliteGradeRepository::try_new(conn)?);

    match command {
        Command::AddStudent { name, email } => {
            let student = students.create_student(name, email)?;
            writeln!(out, "Student created: {} (ID: {})", student.name, student.id)?;
        }
        Command::EditStudent {
            student_id,
            name,
            email,
        } => {
            let update = StudentUpdate {
                name: name.clone(),
                email: email.clone(),
            };
            let student = students.update_student(*student_id, &update)?;
            writeln!(
                out,
                "Student updated: {} <{}> (ID: {})",
                student.name, student.email, student.id
            )?;
        }
        Command::DeleteStudent {
            student_id,
            confirm,
        } => {
            let student = students
                .get_student(*student_id)?
                .ok_or(ServiceError::StudentNotFound(*student_id))?;
            let question = format!(
                "Delete student {} (ID: {}) and all of their grades?",
                student.name, student.id
            );
            if !*confirm && !prompt_yes_no(&question, out, input)? {
                writeln!(out, "Cancelled.")?;
                return Ok(());
            }
            students.delete_student(student.id)?;
            writeln!(out, "Student deleted: {} (ID: {})", student.name, student.id)?;
        }
        Command::ListStudents { student_id } => match student_id {
            Some(id) => show_student(&students.get_student_grades(*id)?, json, out)?,
            None => list_students(&students.list_student_grades()?, json, out)?,
        },
        Command::AddGrade {
            student_id,
            subject,
            score,
        } => {
            let grade = grades.create_grade(*student_id, subject, *score)?;
            writeln!(
                out,
                "Grade added: {} - {} (ID: {})",
                grade.subject,
                format_score(grade.score),
                grade.id
            )?;
        }
        Command::EditGrade {
            grade_id,
            subject,
            score,
        } => {
            let update = GradeUpdate {
                subject: subject.clone(),
                score: *score,
            };
            let grade = grades.update_grade(*grade_id, &update)?;
            writeln!(
                out,
                "Grade updated: {} - {} (ID: {})",
                grade.subject,
                format_score(grade.score),
                grade.id
            )?;
        }
        Command::DeleteGrade { grade_id, confirm } => {
            let grade = grades
                .get_grade(*grade_id)?
                .ok_or(ServiceError::GradeNotFound(*grade_id))?;
            let question = format!(
                "Delete grade {} - {} (ID: {})?",
                grade.subject,
                format_score(grade.score),
                grade.id
            );
            if !*confirm && !prompt_yes_no(&question, out, input)? {
                writeln!(out, "Cancelled.")?;
                return Ok(());
            }
            grades.delete_grade(grade.id)?;
            writeln!(out, "Grade deleted: ID {}", grade.id)?;
        }
        Command::ListGrades { student_id } => match student_id {
            Some(id) => {
                let record = students.get_student_grades(*id)?;
                list_grades(std::slice::from_ref(&record), json, out)?;
            }
            None => list_grades(&students.list_student_grades()?, json, out)?,
        },
        Command::Rankings => print_rankings(&students.rankings()?, json, out)?,
        Command::ExportStudents { output } => {
            let path = output_path(output.as_deref(), ExportKind::Students);
            write_export(&path, &students.export_students_csv()?)?;
            writeln!(out, "Students exported to {}", path.display())?;
        }
        Command::ExportGrades { output } => {
            let path = output_path(output.as_deref(), ExportKind::Grades);
            write_export(&path, &grades.export_grades_csv()?)?;
            writeln!(out, "Grades exported to {}", path.display())?;
        }
    }

    Ok(())
}

fn list_students(records: &[StudentGrades], json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        let rows: Vec<StudentRow<'_>> = records.iter().map(StudentRow::from).collect();
        return print_json(&rows, out);
    }
    if records.is_empty() {
        writeln!(out, "No students found.")?;
        return Ok(());
    }

    writeln!(out, "\nStudents:")?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    for record in records {
        writeln!(
            out,
            "ID: {} | Name: {} | Email: {} | Avg: {:.2} | Grades: {}",
            record.student.id,
            record.student.name,
            record.student.email,
            record.average(),
            record.grade_count()
        )?;
    }
    Ok(())
}

fn show_student(record: &StudentGrades, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        let detail = StudentDetail {
            summary: StudentRow::from(record),
            grades: &record.grades,
        };
        return print_json(&detail, out);
    }

    writeln!(out, "ID: {}", record.student.id)?;
    writeln!(out, "Name: {}", record.student.name)?;
    writeln!(out, "Email: {}", record.student.email)?;
    writeln!(out, "Average: {:.2}", record.average())?;
    list_grades(std::slice::from_ref(record), false, out)
}

fn list_grades(records: &[StudentGrades], json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        let all: Vec<&Grade> = records.iter().flat_map(|record| &record.grades).collect();
        return print_json(&all, out);
    }
    if records.iter().all(|record| record.grades.is_empty()) {
        writeln!(out, "No grades found.")?;
        return Ok(());
    }

    for record in records.iter().filter(|record| !record.grades.is_empty()) {
        writeln!(
            out,
            "\nGrades for {} (ID: {}):",
            record.student.name, record.student.id
        )?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        for grade in &record.grades {
            writeln!(
                out,
                "ID: {} | Subject: {} | Score: {}",
                grade.id,
                grade.subject,
                format_score(grade.score)
            )?;
        }
    }
    Ok(())
}

fn print_rankings(entries: &[RankingEntry], json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        let rows: Vec<RankingRow<'_>> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| RankingRow {
                rank: index + 1,
                id: entry.student.id,
                name: &entry.student.name,
                average: entry.average,
            })
            .collect();
        return print_json(&rows, out);
    }
    if entries.is_empty() {
        writeln!(out, "No rankings available.")?;
        return Ok(());
    }

    writeln!(out, "\nStudent Rankings:")?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    for (index, entry) in entries.iter().enumerate() {
        writeln!(
            out,
            "{}. {} - Average: {:.2}",
            index + 1,
            entry.student.name,
            entry.average
        )?;
    }
    Ok(())
}

fn print_json(value: &impl Serialize, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Asks a yes/no question; anything but `y`/`yes` (or EOF) means no.
fn prompt_yes_no(question: &str, out: &mut impl Write, input: &mut impl BufRead) -> Result<bool> {
    write!(out, "{question} [y/N]: ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn output_path(requested: Option<&Path>, kind: ExportKind) -> PathBuf {
    requested.map_or_else(|| PathBuf::from(kind.file_name()), Path::to_path_buf)
}

fn write_export(path: &Path, csv: &str) -> Result<()> {
    std::fs::write(path, csv).with_context(|| format!("failed to write `{}`", path.display()))?;
    info!("event=export_write module=cli status=ok bytes={}", csv.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::execute;
    use crate::Command;
    use gradebook_core::db::open_db_in_memory;
    use gradebook_core::{ErrorKind, ServiceError};
    use rusqlite::Connection;
    use std::io::Cursor;

    fn run(conn: &Connection, command: Command) -> anyhow::Result<String> {
        run_with_input(conn, command, "")
    }

    fn run_with_input(conn: &Connection, command: Command, input: &str) -> anyhow::Result<String> {
        let mut out = Vec::new();
        let mut input = Cursor::new(input.as_bytes().to_vec());
        execute(&command, conn, false, &mut out, &mut input)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn add_student(conn: &Connection, name: &str, email: &str) {
        run(
            conn,
            Command::AddStudent {
                name: name.to_string(),
                email: email.to_string(),
            },
        )
        .unwrap();
    }

    fn add_grade(conn: &Connection, student_id: i64, subject: &str, score: f64) {
        run(
            conn,
            Command::AddGrade {
                student_id,
                subject: subject.to_string(),
                score,
            },
        )
        .unwrap();
    }

    fn service_kind(err: &anyhow::Error) -> Option<ErrorKind> {
        err.downcast_ref::<ServiceError>().map(ServiceError::kind)
    }

    #[test]
    fn add_and_list_students() {
        let conn = open_db_in_memory().unwrap();
        let output = run(
            &conn,
            Command::AddStudent {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
        )
        .unwrap();
        assert_eq!(output, "Student created: Alice (ID: 1)\n");

        add_grade(&conn, 1, "Math", 85.0);
        add_grade(&conn, 1, "Art", 90.0);

        let listing = run(&conn, Command::ListStudents { student_id: None }).unwrap();
        assert!(listing.contains("ID: 1 | Name: Alice | Email: alice@example.com | Avg: 87.50"));
    }

    #[test]
    fn empty_listings_print_placeholders() {
        let conn = open_db_in_memory().unwrap();
        assert_eq!(
            run(&conn, Command::ListStudents { student_id: None }).unwrap(),
            "No students found.\n"
        );
        assert_eq!(
            run(&conn, Command::Rankings).unwrap(),
            "No rankings available.\n"
        );
        assert_eq!(
            run(&conn, Command::ListGrades { student_id: None }).unwrap(),
            "No grades found.\n"
        );
    }

    #[test]
    fn validation_and_not_found_surface_as_errors() {
        let conn = open_db_in_memory().unwrap();
        add_student(&conn, "Alice", "alice@example.com");

        let err = run(
            &conn,
            Command::AddGrade {
                student_id: 1,
                subject: "Math".to_string(),
                score: 150.0,
            },
        )
        .unwrap_err();
        assert_eq!(service_kind(&err), Some(ErrorKind::Validation));

        let err = run(
            &conn,
            Command::EditStudent {
                student_id: 9,
                name: Some("Nobody".to_string()),
                email: None,
            },
        )
        .unwrap_err();
        assert_eq!(service_kind(&err), Some(ErrorKind::NotFound));

        let err = run(
            &conn,
            Command::AddStudent {
                name: "Alicia".to_string(),
                email: "alice@example.com".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(service_kind(&err), Some(ErrorKind::DuplicateEmail));
    }

    #[test]
    fn delete_without_confirm_prompts_and_can_be_cancelled() {
        let conn = open_db_in_memory().unwrap();
        add_student(&conn, "Alice", "alice@example.com");

        let cancelled = run_with_input(
            &conn,
            Command::DeleteStudent {
                student_id: 1,
                confirm: false,
            },
            "n\n",
        )
        .unwrap();
        assert!(cancelled.contains("[y/N]"));
        assert!(cancelled.ends_with("Cancelled.\n"));

        let deleted = run_with_input(
            &conn,
            Command::DeleteStudent {
                student_id: 1,
                confirm: false,
            },
            "yes\n",
        )
        .unwrap();
        assert!(deleted.ends_with("Student deleted: Alice (ID: 1)\n"));

        let err = run(
            &conn,
            Command::DeleteStudent {
                student_id: 1,
                confirm: true,
            },
        )
        .unwrap_err();
        assert_eq!(service_kind(&err), Some(ErrorKind::NotFound));
    }

    #[test]
    fn delete_grade_with_confirm_skips_prompt() {
        let conn = open_db_in_memory().unwrap();
        add_student(&conn, "Alice", "alice@example.com");
        add_grade(&conn, 1, "Math", 70.0);

        let output = run(
            &conn,
            Command::DeleteGrade {
                grade_id: 1,
                confirm: true,
            },
        )
        .unwrap();
        assert_eq!(output, "Grade deleted: ID 1\n");
    }

    #[test]
    fn edit_grade_changes_only_given_fields() {
        let conn = open_db_in_memory().unwrap();
        add_student(&conn, "Alice", "alice@example.com");
        add_grade(&conn, 1, "Math", 70.0);

        let output = run(
            &conn,
            Command::EditGrade {
                grade_id: 1,
                subject: None,
                score: Some(88.5),
            },
        )
        .unwrap();
        assert_eq!(output, "Grade updated: Math - 88.5 (ID: 1)\n");
    }

    #[test]
    fn rankings_print_one_based_positions() {
        let conn = open_db_in_memory().unwrap();
        add_student(&conn, "Bob", "bob@example.com");
        add_student(&conn, "Alice", "alice@example.com");
        add_grade(&conn, 1, "Math", 85.0);
        add_grade(&conn, 2, "Math", 95.0);
        add_grade(&conn, 2, "Art", 90.0);

        let output = run(&conn, Command::Rankings).unwrap();
        assert!(output.contains("1. Alice - Average: 92.50\n2. Bob - Average: 85.00\n"));
    }

    #[test]
    fn json_rankings_include_rank_and_average() {
        let conn = open_db_in_memory().unwrap();
        add_student(&conn, "Alice", "alice@example.com");
        add_grade(&conn, 1, "Math", 90.0);

        let mut out = Vec::new();
        execute(
            &Command::Rankings,
            &conn,
            true,
            &mut out,
            &mut Cursor::new(Vec::new()),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["rank"], 1);
        assert_eq!(value[0]["name"], "Alice");
        assert_eq!(value[0]["average"], 90.0);
    }

    #[test]
    fn exports_write_csv_files() {
        let conn = open_db_in_memory().unwrap();
        add_student(&conn, "Alice", "alice@example.com");
        add_grade(&conn, 1, "Math", 95.0);

        let dir = tempfile::tempdir().unwrap();
        let students_path = dir.path().join("out-students.csv");
        let grades_path = dir.path().join("out-grades.csv");

        run(
            &conn,
            Command::ExportStudents {
                output: Some(students_path.clone()),
            },
        )
        .unwrap();
        run(
            &conn,
            Command::ExportGrades {
                output: Some(grades_path.clone()),
            },
        )
        .unwrap();

        let students_csv = std::fs::read_to_string(&students_path).unwrap();
        assert!(students_csv.starts_with("ID,Name,Email,Average Grade,Number of Grades\r\n"));
        assert!(students_csv.contains("1,Alice,alice@example.com,95.00,1"));

        let grades_csv = std::fs::read_to_string(&grades_path).unwrap();
        assert!(grades_csv.starts_with("Grade ID,Student Name,Subject,Score,Date\r\n"));
        assert!(grades_csv.contains("1,Alice,Math,95.0,"));
    }
}
