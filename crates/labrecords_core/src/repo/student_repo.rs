//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD-style APIs over the `students` collection.
//! - Own audit timestamp stamping and soft-delete visibility rules.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Student::validate()` before SQL mutations.
//! - `id`, `date_created` and `is_deleted` are never written by updates.
//! - After a successful write the caller's record carries the stored
//!   lifecycle metadata (timestamps, tombstone flag).
//! - Every successful mutation leaves `date_modified` >= its previous value.
//! - Default reads (`include_deleted = false`) never surface tombstones.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::record::{
    BaseRecord, EpochMillis, RecordId, RecordMeta, RecordValidationError,
};
use crate::model::student::{Student, StudentValidationError};
use crate::time::{SystemTimeSource, TimeSource};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const STUDENTS_TABLE: &str = "students";

const STUDENT_COLUMNS: [&str; 7] = [
    "id",
    "first_name",
    "last_name",
    "email",
    "date_created",
    "date_modified",
    "is_deleted",
];

const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    email,
    date_created,
    date_modified,
    is_deleted
FROM students";

// ?1 is "now"; the result is never below the stored modified/created values.
const ADVANCE_MODIFIED_SQL: &str =
    "MAX(?1, COALESCE(date_modified, ?1), COALESCE(date_created, ?1))";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for student persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Entity failed validation; nothing was written.
    Validation(StudentValidationError),
    /// Storage engine failure, surfaced unchanged.
    Db(DbError),
    /// No record with this id (or no active one, for update paths).
    NotFound(RecordId),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "student not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted student data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "student repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "student repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "student repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<StudentValidationError> for RepoError {
    fn from(value: StudentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(StudentValidationError::Record(value))
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing students.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentListQuery {
    /// Exact last-name match.
    pub last_name: Option<String>,
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for the `students` collection.
pub trait StudentRepository {
    /// Inserts a new student, stamping `date_created`/`date_modified` into
    /// `student` on success. Returns the stable id.
    fn create_student(&self, student: &mut Student) -> RepoResult<RecordId>;
    /// Writes business fields of an active student and advances
    /// `date_modified`, then replaces the lifecycle metadata of `student`
    /// with the stored row's (`date_created`, `date_modified`, `is_deleted`).
    fn update_student(&self, student: &mut Student) -> RepoResult<()>;
    fn get_student(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Student>>;
    /// Lists students ordered by `date_modified DESC, id ASC`.
    fn list_students(&self, query: &StudentListQuery) -> RepoResult<Vec<Student>>;
    /// Tombstones a student. Idempotent.
    fn soft_delete_student(&self, id: RecordId) -> RepoResult<()>;
    /// Clears a tombstone. Idempotent.
    fn restore_student(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn, T: TimeSource = SystemTimeSource> {
    conn: &'conn Connection,
    time: T,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Wraps a migrated connection, reading time from the system clock.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::try_with_time_source(conn, SystemTimeSource)
    }
}

impl<'conn, T: TimeSource> SqliteStudentRepository<'conn, T> {
    /// Same checks as `try_new`, with an injected time source.
    pub fn try_with_time_source(conn: &'conn Connection, time: T) -> RepoResult<Self> {
        ensure_students_connection_ready(conn)?;
        Ok(Self::from_verified(conn, time))
    }

    /// Skips schema checks; callers must have run
    /// `ensure_students_connection_ready` on `conn`.
    pub(crate) fn from_verified(conn: &'conn Connection, time: T) -> Self {
        Self { conn, time }
    }

    fn set_deleted(&self, id: RecordId, is_deleted: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE students
                 SET
                    is_deleted = ?2,
                    date_modified = {ADVANCE_MODIFIED_SQL}
                 WHERE id = ?3;"
            ),
            params![
                self.time.now_epoch_ms(),
                bool_to_int(is_deleted),
                id.to_string()
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

impl<T: TimeSource> StudentRepository for SqliteStudentRepository<'_, T> {
    fn create_student(&self, student: &mut Student) -> RepoResult<RecordId> {
        let mut candidate = student.clone();
        candidate.meta_mut().stamp_created(self.time.now_epoch_ms());
        candidate.validate()?;

        self.conn.execute(
            "INSERT INTO students (
                id,
                first_name,
                last_name,
                email,
                date_created,
                date_modified,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                candidate.meta().id().to_string(),
                candidate.first_name.as_str(),
                candidate.last_name.as_str(),
                candidate.email.as_deref(),
                candidate.meta().date_created(),
                candidate.meta().date_modified(),
                bool_to_int(candidate.meta().is_deleted()),
            ],
        )?;

        *student = candidate;
        Ok(student.id())
    }

    fn update_student(&self, student: &mut Student) -> RepoResult<()> {
        student.validate()?;

        let id = student.id();
        let stored = self
            .conn
            .query_row(
                &format!(
                    "UPDATE students
                     SET
                        first_name = ?2,
                        last_name = ?3,
                        email = ?4,
                        date_modified = {ADVANCE_MODIFIED_SQL}
                     WHERE id = ?5 AND is_deleted = 0
                     RETURNING date_created, date_modified, is_deleted;"
                ),
                params![
                    self.time.now_epoch_ms(),
                    student.first_name.as_str(),
                    student.last_name.as_str(),
                    student.email.as_deref(),
                    id.to_string(),
                ],
                |row| {
                    Ok((
                        row.get::<_, Option<EpochMillis>>(0)?,
                        row.get::<_, Option<EpochMillis>>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((date_created, date_modified, is_deleted)) = stored else {
            return Err(RepoError::NotFound(id));
        };

        // Storage owns lifecycle state; the caller's copy mirrors the row.
        let meta = RecordMeta::from_parts(
            id,
            date_created,
            date_modified,
            parse_is_deleted(is_deleted)?,
        )
        .map_err(|err| RepoError::InvalidData(format!("student {id}: {err}")))?;
        student.sync_meta(meta);

        Ok(())
    }

    fn get_student(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }

        Ok(None)
    }

    fn list_students(&self, query: &StudentListQuery) -> RepoResult<Vec<Student>> {
        let mut sql = format!("{STUDENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }

        if let Some(last_name) = query.last_name.as_deref() {
            sql.push_str(" AND last_name = ?");
            bind_values.push(Value::Text(last_name.to_string()));
        }

        sql.push_str(" ORDER BY date_modified DESC, id ASC");

        match (query.limit, query.offset) {
            (Some(limit), offset) => {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                if offset > 0 {
                    sql.push_str(" OFFSET ?");
                    bind_values.push(Value::Integer(i64::from(offset)));
                }
            }
            (None, offset) if offset > 0 => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(offset)));
            }
            (None, _) => {}
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut students = Vec::new();

        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }

        Ok(students)
    }

    fn soft_delete_student(&self, id: RecordId) -> RepoResult<()> {
        self.set_deleted(id, true)
    }

    fn restore_student(&self, id: RecordId) -> RepoResult<()> {
        self.set_deleted(id, false)
    }
}

/// Verifies that `conn` carries the migrated `students` schema.
pub(crate) fn ensure_students_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, STUDENTS_TABLE)? {
        return Err(RepoError::MissingRequiredTable(STUDENTS_TABLE));
    }

    for column in STUDENT_COLUMNS {
        if !table_has_column(conn, STUDENTS_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: STUDENTS_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in students.id"))
    })?;

    let is_deleted = parse_is_deleted(row.get("is_deleted")?)?;

    let meta = RecordMeta::from_parts(
        id,
        row.get("date_created")?,
        row.get("date_modified")?,
        is_deleted,
    )
    .map_err(|err| RepoError::InvalidData(format!("student {id_text}: {err}")))?;

    let mut student = Student::with_meta(
        meta,
        row.get::<_, String>("first_name")?,
        row.get::<_, String>("last_name")?,
    );
    student.email = row.get("email")?;
    student
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("student {id_text}: {err}")))?;

    Ok(student)
}

fn parse_is_deleted(value: i64) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid is_deleted value `{other}` in students.is_deleted"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
