//! `labrecords` command line entry point.
//!
//! # Responsibility
//! - Drive the student collection of a file-backed record store.
//! - Keep output line-oriented and deterministic for scripting.

use clap::{Parser, Subcommand};
use labrecords_core::{
    core_version, default_log_level, init_logging, BaseRecord, NewStudent, RecordStore,
    SqliteRecordStore, StoreConfig, Student, StudentListQuery, StudentService,
};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "labrecords", version, about = "Manage lab student records")]
struct Cli {
    /// SQLite database file; created when missing.
    #[arg(short, long, default_value = "labrecords.db")]
    db: PathBuf,

    /// Absolute directory for rotating log files. Logging is off when unset.
    #[arg(long)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a student and print its id.
    Add {
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// List students, most recently modified first.
    List {
        /// Include soft-deleted students.
        #[arg(long)]
        all: bool,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Soft-delete a student.
    Delete { id: Uuid },
    /// Undo a soft delete.
    Restore { id: Uuid },
    /// Print the core library version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        if let Err(err) = init_logging(&level, log_dir) {
            eprintln!("labrecords: {err}");
            return ExitCode::FAILURE;
        }
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("labrecords: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Command::Version = cli.command {
        println!("labrecords_core version={}", core_version());
        return Ok(());
    }

    let store = SqliteRecordStore::open(&StoreConfig::file(&cli.db))?;
    let service = StudentService::new(store.students());

    match cli.command {
        Command::Add {
            first_name,
            last_name,
            email,
        } => {
            let student = service.register(NewStudent {
                first_name,
                last_name,
                email,
            })?;
            println!("{}", student.id());
        }
        Command::List { all, last_name } => {
            let query = StudentListQuery {
                last_name,
                include_deleted: all,
                ..StudentListQuery::default()
            };
            for student in service.list(&query)? {
                println!("{}", format_row(&student));
            }
        }
        Command::Delete { id } => service.soft_delete(id)?,
        Command::Restore { id } => service.restore(id)?,
        Command::Version => {}
    }

    Ok(())
}

fn format_row(student: &Student) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        student.id(),
        student.full_name(),
        student.email.as_deref().unwrap_or("-"),
        if student.is_active() { "active" } else { "deleted" }
    )
}

#[cfg(test)]
mod tests {
    use super::{format_row, Cli, Command};
    use clap::Parser;
    use labrecords_core::{RecordMeta, Student};
    use uuid::Uuid;

    #[test]
    fn parses_add_with_email() {
        let cli = Cli::parse_from([
            "labrecords",
            "--db",
            "/tmp/lab.db",
            "add",
            "Ada",
            "Lovelace",
            "--email",
            "ada@uni.example",
        ]);
        match cli.command {
            Command::Add {
                first_name,
                last_name,
                email,
            } => {
                assert_eq!(first_name, "Ada");
                assert_eq!(last_name, "Lovelace");
                assert_eq!(email.as_deref(), Some("ada@uni.example"));
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(Cli::try_parse_from(["labrecords", "delete", "not-a-uuid"]).is_err());
    }

    #[test]
    fn row_marks_deleted_students() {
        let meta = RecordMeta::from_parts(Uuid::new_v4(), Some(1), Some(1), true).unwrap();
        let student = Student::with_meta(meta, "Ada", "Lovelace");
        let row = format_row(&student);
        assert!(row.ends_with("Ada Lovelace\t-\tdeleted"));
    }
}
