//! Student entity.
//!
//! # Responsibility
//! - Define the student record stored in the `students` collection.
//! - Validate business fields on top of base record invariants.
//!
//! # Invariants
//! - Names are non-blank after trimming.
//! - `email`, when present, has one `@` with non-empty local and domain parts.

use crate::model::record::{BaseRecord, RecordMeta, RecordValidationError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation errors for student writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentValidationError {
    Record(RecordValidationError),
    BlankFirstName,
    BlankLastName,
    InvalidEmail(String),
}

impl Display for StudentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Record(err) => write!(f, "{err}"),
            Self::BlankFirstName => write!(f, "first_name must not be blank"),
            Self::BlankLastName => write!(f, "last_name must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for StudentValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Record(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for StudentValidationError {
    fn from(value: RecordValidationError) -> Self {
        Self::Record(value)
    }
}

/// A student enrolled in the lab records collection.
///
/// Identity is fixed once the value exists; the metadata cannot be swapped
/// from outside the crate:
///
/// ```compile_fail
/// use labrecords_core::{RecordMeta, Student};
///
/// let mut student = Student::new("Ada", "Lovelace");
/// student.meta = RecordMeta::new();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Identity and lifecycle metadata, serialized inline. Fixed at
    /// construction; only the repository replaces it with stored state.
    #[serde(flatten)]
    meta: RecordMeta,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Student {
    /// Creates an unsaved student with a generated id.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self::with_meta(RecordMeta::new(), first_name, last_name)
    }

    /// Creates a student around existing metadata (imports, row hydration).
    pub fn with_meta(
        meta: RecordMeta,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            meta,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
        }
    }

    /// Builder-style email setter.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Replaces lifecycle metadata with the state read back from storage.
    ///
    /// The id never changes: callers pass metadata of the same record.
    pub(crate) fn sync_meta(&mut self, stored: RecordMeta) {
        debug_assert_eq!(stored.id(), self.meta.id());
        self.meta = stored;
    }

    pub(crate) fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    /// `"<first> <last>"`, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    pub fn validate(&self) -> Result<(), StudentValidationError> {
        self.meta.validate()?;

        if self.first_name.trim().is_empty() {
            return Err(StudentValidationError::BlankFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(StudentValidationError::BlankLastName);
        }
        if let Some(email) = self.email.as_deref() {
            if !is_plausible_email(email) {
                return Err(StudentValidationError::InvalidEmail(email.to_string()));
            }
        }

        Ok(())
    }
}

impl BaseRecord for Student {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

fn is_plausible_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !value.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}
