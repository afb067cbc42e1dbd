//! Gradebook command-line entry point.
//!
//! # Responsibility
//! - Parse flags/env into a command and open the configured database.
//! - Map every failure to exit code 1 with a one-line message on stderr.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gradebook_core::db::open_db;
use gradebook_core::{default_log_level, init_logging, LogConfig};
use log::error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Manage students and grades stored in a local SQLite database.
#[derive(Parser, Debug)]
#[command(name = "gradebook", version)]
pub struct Args {
    /// Database file to use (created on first run)
    #[arg(long, global = true, env = "GRADEBOOK_DB", default_value = "students.db")]
    pub db: PathBuf,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, env = "GRADEBOOK_LOG")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "GRADEBOOK_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Print list and ranking output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a new student
    AddStudent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Change a student's name and/or email
    EditStudent {
        #[arg(long)]
        student_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Delete a student together with all of its grades
    DeleteStudent {
        #[arg(long)]
        student_id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        confirm: bool,
    },

    /// List all students, or show one student with its grades
    ListStudents {
        #[arg(long)]
        student_id: Option<i64>,
    },

    /// Record a grade for a student
    AddGrade {
        #[arg(long)]
        student_id: i64,
        #[arg(long)]
        subject: String,
        /// Score between 0 and 100
        #[arg(long, allow_negative_numbers = true)]
        score: f64,
    },

    /// Change a grade's subject and/or score
    EditGrade {
        #[arg(long)]
        grade_id: i64,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        score: Option<f64>,
    },

    /// Delete a single grade
    DeleteGrade {
        #[arg(long)]
        grade_id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        confirm: bool,
    },

    /// List grades of one student, or of everyone
    ListGrades {
        #[arg(long)]
        student_id: Option<i64>,
    },

    /// Rank graded students by average
    Rankings,

    /// Write the student summary CSV
    ExportStudents {
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write the grade listing CSV
    ExportGrades {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(parse_exit_code(&err));
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error");
            let _ = writeln!(io::stderr(), "{}", failure_line(&err));
            ExitCode::FAILURE
        }
    }
}

/// `--help`/`--version` exit 0; any rejected argument exits 1 like other
/// input errors.
fn parse_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

/// One stderr line for a failed command. Causes whose text is already part
/// of the message are not repeated.
fn failure_line(err: &anyhow::Error) -> String {
    let mut message = err.to_string();
    for cause in err.chain().skip(1) {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
    }
    format!("Error: {message}")
}

fn run(args: &Args) -> Result<()> {
    if let Some(log_dir) = args.log_dir.as_deref() {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(&LogConfig::parse(level, log_dir)?)?;
    }

    ensure_parent_dir(&args.db)?;
    let conn = open_db(&args.db)?;

    let stdout = io::stdout();
    let stdin = io::stdin();
    commands::execute(
        &args.command,
        &conn,
        args.json,
        &mut stdout.lock(),
        &mut stdin.lock(),
    )
}

fn ensure_parent_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database directory `{}`", parent.display()))?;
    }
    Ok(())
}
