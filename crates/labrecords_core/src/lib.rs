//! Core persistence logic for lab records.
//! This crate owns the base record invariants and the record store contract.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod time;

pub use config::{ConfigError, StoreConfig, StoreTarget};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::record::{BaseRecord, EpochMillis, RecordId, RecordMeta, RecordValidationError};
pub use model::student::{Student, StudentValidationError};
pub use repo::student_repo::{
    RepoError, RepoResult, SqliteStudentRepository, StudentListQuery, StudentRepository,
};
pub use service::student_service::{NewStudent, StudentChanges, StudentService};
pub use store::{RecordStore, SqliteRecordStore};
pub use time::{SystemTimeSource, TimeSource};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
