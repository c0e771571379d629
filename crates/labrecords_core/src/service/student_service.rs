//! Student use-case service.
//!
//! # Responsibility
//! - Provide register/update/get/list/delete entry points for core callers.
//! - Delegate persistence to a `StudentRepository` implementation.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.
//! - Log lines carry ids only, never names or email addresses.

use crate::model::record::RecordId;
use crate::model::student::Student;
use crate::repo::student_repo::{RepoError, RepoResult, StudentListQuery, StudentRepository};
use log::{debug, info, warn};

/// Request model for registering a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

/// Partial update of student business fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `Some(None)` clears the email.
    pub email: Option<Option<String>>,
}

impl StudentChanges {
    /// Applies the changes and reports whether any field actually changed.
    fn apply_to(&self, student: &mut Student) -> bool {
        let mut changed = false;
        if let Some(first_name) = &self.first_name {
            changed |= replace_if_different(&mut student.first_name, first_name);
        }
        if let Some(last_name) = &self.last_name {
            changed |= replace_if_different(&mut student.last_name, last_name);
        }
        if let Some(email) = &self.email {
            changed |= replace_if_different(&mut student.email, email);
        }
        changed
    }
}

fn replace_if_different<V: PartialEq + Clone>(slot: &mut V, value: &V) -> bool {
    if slot == value {
        return false;
    }
    *slot = value.clone();
    true
}

/// Use-case service wrapper for student operations.
pub struct StudentService<R: StudentRepository> {
    repo: R,
}

impl<R: StudentRepository> StudentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Registers a new student and returns it with stamped timestamps.
    pub fn register(&self, request: NewStudent) -> RepoResult<Student> {
        let mut student = Student::new(request.first_name, request.last_name);
        student.email = request.email;

        match self.repo.create_student(&mut student) {
            Ok(id) => {
                info!("event=student_register module=service status=ok id={id}");
                Ok(student)
            }
            Err(err) => {
                warn!(
                    "event=student_register module=service status=error error_code={}",
                    error_code(&err)
                );
                Err(err)
            }
        }
    }

    /// Applies `changes` to an active student.
    ///
    /// # Contract
    /// - Returns the current record unchanged (no `date_modified` bump) when
    ///   `changes` matches what is stored.
    /// - Returns `NotFound` for missing or soft-deleted students.
    pub fn update_details(&self, id: RecordId, changes: &StudentChanges) -> RepoResult<Student> {
        let mut student = self
            .repo
            .get_student(id, false)?
            .ok_or(RepoError::NotFound(id))?;

        if !changes.apply_to(&mut student) {
            debug!("event=student_update module=service status=noop id={id}");
            return Ok(student);
        }

        self.repo.update_student(&mut student)?;
        info!("event=student_update module=service status=ok id={id}");
        Ok(student)
    }

    /// Gets one student by id with optional deleted-row visibility.
    pub fn get(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Student>> {
        self.repo.get_student(id, include_deleted)
    }

    pub fn list(&self, query: &StudentListQuery) -> RepoResult<Vec<Student>> {
        self.repo.list_students(query)
    }

    /// Soft-deletes a student. The row stays in storage.
    pub fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        self.repo.soft_delete_student(id)?;
        info!("event=student_delete module=service status=ok id={id}");
        Ok(())
    }

    pub fn restore(&self, id: RecordId) -> RepoResult<()> {
        self.repo.restore_student(id)?;
        info!("event=student_restore module=service status=ok id={id}");
        Ok(())
    }
}

fn error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::Validation(_) => "validation_failed",
        RepoError::NotFound(_) => "not_found",
        RepoError::Db(_) => "db_error",
        RepoError::InvalidData(_) => "invalid_data",
        RepoError::UninitializedConnection { .. }
        | RepoError::MissingRequiredTable(_)
        | RepoError::MissingRequiredColumn { .. } => "schema_mismatch",
    }
}

#[cfg(test)]
mod tests {
    use super::StudentChanges;
    use crate::model::student::Student;

    #[test]
    fn apply_reports_no_change_for_identical_values() {
        let mut student = Student::new("Ada", "Lovelace");
        let changes = StudentChanges {
            first_name: Some("Ada".to_string()),
            email: Some(None),
            ..StudentChanges::default()
        };
        assert!(!changes.apply_to(&mut student));
    }

    #[test]
    fn apply_sets_and_clears_email() {
        let mut student = Student::new("Ada", "Lovelace");
        let set = StudentChanges {
            email: Some(Some("ada@uni.example".to_string())),
            ..StudentChanges::default()
        };
        assert!(set.apply_to(&mut student));
        assert_eq!(student.email.as_deref(), Some("ada@uni.example"));

        let clear = StudentChanges {
            email: Some(None),
            ..StudentChanges::default()
        };
        assert!(clear.apply_to(&mut student));
        assert_eq!(student.email, None);
    }
}
