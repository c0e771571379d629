use labrecords_core::{BaseRecord, RecordMeta, RecordValidationError, Student};
use std::collections::HashSet;
use uuid::Uuid;

#[test]
fn new_record_sets_defaults() {
    let student = Student::new("Ada", "Lovelace");

    assert!(!student.id().is_nil());
    assert_eq!(student.meta().date_created(), None);
    assert_eq!(student.meta().date_modified(), None);
    assert!(!student.meta().is_deleted());
    assert!(student.is_active());
    assert_eq!(student.email, None);
}

#[test]
fn generated_ids_do_not_collide() {
    let ids: HashSet<_> = (0..1_000).map(|_| RecordMeta::new().id()).collect();
    assert_eq!(ids.len(), 1_000);
}

#[test]
fn tombstoned_metadata_is_inactive_and_keeps_identity() {
    let id = Uuid::new_v4();
    let meta = RecordMeta::from_parts(id, Some(1_000), Some(2_000), true).unwrap();
    let student = Student::with_meta(meta, "Grace", "Hopper");

    assert!(student.meta().is_deleted());
    assert!(!student.is_active());
    assert_eq!(student.id(), id);
}

#[test]
fn touch_on_unsaved_record_stamps_creation_too() {
    let mut meta = RecordMeta::new();
    meta.touch(7_000);

    assert_eq!(meta.date_created(), Some(7_000));
    assert_eq!(meta.date_modified(), Some(7_000));
}

#[test]
fn with_id_rejects_nil_uuid() {
    let err = RecordMeta::with_id(Uuid::nil()).unwrap_err();
    assert_eq!(err, RecordValidationError::NilId);
}

#[test]
fn touch_advances_modified_and_keeps_created() {
    let mut meta = RecordMeta::from_parts(Uuid::new_v4(), Some(1_000), Some(1_000), false).unwrap();

    meta.touch(2_000);
    assert_eq!(meta.date_created(), Some(1_000));
    assert_eq!(meta.date_modified(), Some(2_000));

    // A clock that jumped backwards never rewinds the record.
    meta.touch(1_500);
    assert_eq!(meta.date_modified(), Some(2_000));
    assert!(meta.validate().is_ok());
}

#[test]
fn student_serialization_uses_flat_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let meta = RecordMeta::from_parts(id, Some(1_700_000_000_000), Some(1_700_000_360_000), true)
        .unwrap();
    let student = Student::with_meta(meta, "Ada", "Lovelace").with_email("ada@uni.example");

    let json = serde_json::to_value(&student).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["date_created"], 1_700_000_000_000_i64);
    assert_eq!(json["date_modified"], 1_700_000_360_000_i64);
    assert_eq!(json["is_deleted"], true);
    assert_eq!(json["first_name"], "Ada");
    assert_eq!(json["last_name"], "Lovelace");
    assert_eq!(json["email"], "ada@uni.example");

    let decoded: Student = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, student);
}

#[test]
fn deserialize_defaults_optional_lifecycle_fields() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "first_name": "Ada",
        "last_name": "Lovelace"
    });

    let student: Student = serde_json::from_value(value).unwrap();
    assert!(student.is_active());
    assert_eq!(student.meta().date_created(), None);
    assert_eq!(student.meta().date_modified(), None);
    assert_eq!(student.email, None);
}

#[test]
fn deserialize_rejects_reversed_timestamps() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "date_created": 200,
        "date_modified": 100,
        "is_deleted": false,
        "first_name": "Ada",
        "last_name": "Lovelace"
    });

    let err = serde_json::from_value::<Student>(value).unwrap_err();
    assert!(
        err.to_string()
            .contains("date_modified (100) must be >= date_created (200)"),
        "unexpected error: {err}"
    );
}

#[test]
fn deserialize_rejects_nil_id() {
    let value = serde_json::json!({
        "id": "00000000-0000-0000-0000-000000000000",
        "first_name": "Ada",
        "last_name": "Lovelace"
    });

    let err = serde_json::from_value::<RecordMeta>(value).unwrap_err();
    assert!(err.to_string().contains("must not be nil"), "unexpected error: {err}");
}
