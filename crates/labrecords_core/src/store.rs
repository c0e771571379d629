//! Record store handle.
//!
//! # Responsibility
//! - Expose one typed repository accessor per entity collection.
//! - Own the engine connection, built from a `StoreConfig`.
//!
//! # Invariants
//! - A store is only constructed over a migrated, schema-verified connection.
//! - The store declares collections; it adds no mapping or query logic of
//!   its own.

use crate::config::StoreConfig;
use crate::db::open_db_with;
use crate::repo::student_repo::{
    ensure_students_connection_ready, RepoResult, SqliteStudentRepository, StudentRepository,
    STUDENTS_TABLE,
};
use crate::time::{SystemTimeSource, TimeSource};
use log::info;
use rusqlite::Connection;

/// Named, typed entity collections backed by a storage engine.
pub trait RecordStore {
    /// Names of the collections this store exposes.
    const COLLECTIONS: &'static [&'static str];

    type Students<'a>: StudentRepository
    where
        Self: 'a;

    fn students(&self) -> Self::Students<'_>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<T: TimeSource = SystemTimeSource> {
    conn: Connection,
    time: T,
    config: StoreConfig,
}

impl SqliteRecordStore {
    /// Opens the store described by `config`, reading time from the system
    /// clock.
    pub fn open(config: &StoreConfig) -> RepoResult<Self> {
        Self::open_with_time_source(config, SystemTimeSource)
    }
}

impl<T: TimeSource> SqliteRecordStore<T> {
    /// Opens the store described by `config` with an injected time source.
    ///
    /// # Errors
    /// - `Db` for invalid config, engine open or migration failures.
    /// - Schema errors when the database does not carry the expected tables.
    pub fn open_with_time_source(config: &StoreConfig, time: T) -> RepoResult<Self> {
        let conn = open_db_with(config)?;
        ensure_students_connection_ready(&conn)?;
        info!(
            "event=store_open module=store status=ok mode={} collections={}",
            config.mode(),
            Self::COLLECTIONS.join(",")
        );
        Ok(Self {
            conn,
            time,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Raw engine connection, for callers that need engine-level access.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl<T: TimeSource> RecordStore for SqliteRecordStore<T> {
    const COLLECTIONS: &'static [&'static str] = &[STUDENTS_TABLE];

    type Students<'a>
        = SqliteStudentRepository<'a, &'a T>
    where
        Self: 'a;

    fn students(&self) -> Self::Students<'_> {
        SqliteStudentRepository::from_verified(&self.conn, &self.time)
    }
}
