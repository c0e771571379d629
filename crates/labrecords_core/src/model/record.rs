//! Base record field group shared by every persisted entity.
//!
//! # Responsibility
//! - Carry identity and lifecycle metadata (`id`, audit timestamps,
//!   soft-delete flag) for any entity that embeds it.
//! - Provide the `BaseRecord` capability trait entities implement by
//!   composition.
//!
//! # Invariants
//! - `id` is never nil and has no setter; it is fixed at construction.
//! - `date_created <= date_modified` whenever both are set.
//! - `date_created` is written at most once.
//! - `is_deleted` is the source of truth for tombstone state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a persisted record.
pub type RecordId = Uuid;

/// Unix epoch milliseconds.
pub type EpochMillis = i64;

/// Invariant violations of the base record field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Identifiers must not be the nil UUID.
    NilId,
    /// Modification timestamp precedes the creation timestamp.
    CreatedAfterModified {
        created: EpochMillis,
        modified: EpochMillis,
    },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "record id must not be nil"),
            Self::CreatedAfterModified { created, modified } => write!(
                f,
                "date_modified ({modified}) must be >= date_created ({created})"
            ),
        }
    }
}

impl Error for RecordValidationError {}

/// Identity and lifecycle metadata embedded in every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordMetaWire")]
pub struct RecordMeta {
    id: RecordId,
    date_created: Option<EpochMillis>,
    date_modified: Option<EpochMillis>,
    is_deleted: bool,
}

#[derive(Deserialize)]
struct RecordMetaWire {
    id: RecordId,
    #[serde(default)]
    date_created: Option<EpochMillis>,
    #[serde(default)]
    date_modified: Option<EpochMillis>,
    #[serde(default)]
    is_deleted: bool,
}

impl TryFrom<RecordMetaWire> for RecordMeta {
    type Error = RecordValidationError;

    fn try_from(wire: RecordMetaWire) -> Result<Self, Self::Error> {
        Self::from_parts(
            wire.id,
            wire.date_created,
            wire.date_modified,
            wire.is_deleted,
        )
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordMeta {
    /// Creates metadata for a brand-new record with a random v4 id.
    ///
    /// Timestamps stay unset until the record is first persisted.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            date_created: None,
            date_modified: None,
            is_deleted: false,
        }
    }

    /// Creates metadata for a record whose id was assigned elsewhere
    /// (imports, sync).
    ///
    /// # Errors
    /// - `NilId` when `id` is the nil UUID.
    pub fn with_id(id: RecordId) -> Result<Self, RecordValidationError> {
        Self::from_parts(id, None, None, false)
    }

    /// Rebuilds metadata from persisted parts, validating every invariant.
    pub fn from_parts(
        id: RecordId,
        date_created: Option<EpochMillis>,
        date_modified: Option<EpochMillis>,
        is_deleted: bool,
    ) -> Result<Self, RecordValidationError> {
        let meta = Self {
            id,
            date_created,
            date_modified,
            is_deleted,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn date_created(&self) -> Option<EpochMillis> {
        self.date_created
    }

    pub fn date_modified(&self) -> Option<EpochMillis> {
        self.date_modified
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Returns whether the record should appear in default views.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Checks identity and timestamp ordering.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.id.is_nil() {
            return Err(RecordValidationError::NilId);
        }
        if let (Some(created), Some(modified)) = (self.date_created, self.date_modified) {
            if created > modified {
                return Err(RecordValidationError::CreatedAfterModified { created, modified });
            }
        }
        Ok(())
    }

    /// Advances `date_modified` to `now`, never moving it backwards and never
    /// below `date_created`.
    ///
    /// A record that was never stamped gets both timestamps, so `touch` can
    /// not produce a modification time without a creation time.
    pub fn touch(&mut self, now: EpochMillis) {
        if self.date_created.is_none() {
            self.stamp_created(now);
            return;
        }
        let floor = self
            .date_modified
            .into_iter()
            .chain(self.date_created)
            .max()
            .unwrap_or(now);
        self.date_modified = Some(now.max(floor));
    }

    /// Stamps creation metadata for a first persist.
    ///
    /// A caller-supplied `date_created` is kept; otherwise it becomes `now`.
    /// `date_modified` is raised to at least `date_created`.
    pub(crate) fn stamp_created(&mut self, now: EpochMillis) {
        let created = *self.date_created.get_or_insert(now);
        self.date_modified = Some(self.date_modified.map_or(created, |m| m.max(created)));
    }
}

/// Capability set of a persisted entity: identity, audit timestamps and a
/// soft-delete flag, supplied by an embedded `RecordMeta`.
///
/// The trait is read-only. Lifecycle changes (soft delete, restore,
/// modification time) go through the owning repository, which persists them
/// and hands the stored metadata back.
pub trait BaseRecord {
    fn meta(&self) -> &RecordMeta;

    fn id(&self) -> RecordId {
        self.meta().id()
    }

    fn is_active(&self) -> bool {
        self.meta().is_active()
    }
}

impl BaseRecord for RecordMeta {
    fn meta(&self) -> &RecordMeta {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordMeta, RecordValidationError};
    use uuid::Uuid;

    #[test]
    fn touch_never_moves_backwards() {
        let mut meta = RecordMeta::new();
        meta.stamp_created(1_000);
        meta.touch(5_000);
        meta.touch(2_000);
        assert_eq!(meta.date_modified(), Some(5_000));
        assert_eq!(meta.date_created(), Some(1_000));
    }

    #[test]
    fn touch_on_unstamped_record_stamps_both_timestamps() {
        let mut meta = RecordMeta::new();
        meta.touch(42);
        assert_eq!(meta.date_created(), Some(42));
        assert_eq!(meta.date_modified(), Some(42));
    }

    #[test]
    fn touch_on_record_with_only_modified_time_keeps_ordering() {
        let mut meta = RecordMeta::from_parts(Uuid::new_v4(), None, Some(500), false).unwrap();
        meta.touch(300);
        assert_eq!(meta.date_created(), Some(300));
        assert_eq!(meta.date_modified(), Some(500));
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn stamp_created_keeps_caller_supplied_creation_time() {
        let mut meta = RecordMeta::from_parts(Uuid::new_v4(), Some(100), None, false).unwrap();
        meta.stamp_created(900);
        assert_eq!(meta.date_created(), Some(100));
        assert_eq!(meta.date_modified(), Some(100));
    }

    #[test]
    fn stamp_created_raises_stale_modified_time() {
        let mut meta = RecordMeta::from_parts(Uuid::new_v4(), None, Some(10), false).unwrap();
        meta.stamp_created(20);
        assert_eq!(meta.date_created(), Some(20));
        assert_eq!(meta.date_modified(), Some(20));
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn from_parts_rejects_reversed_timestamps() {
        let err = RecordMeta::from_parts(Uuid::new_v4(), Some(20), Some(10), false).unwrap_err();
        assert_eq!(
            err,
            RecordValidationError::CreatedAfterModified {
                created: 20,
                modified: 10
            }
        );
    }
}
