use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

use schemer::config::Config;
use schemer::schema::types::FieldType;
use schemer::{ConsistencyEngine, Error, Mutation, ProjectFile, SchemaEditor};

/// A file written before relations were persisted: `Post.user_id` has no relation yet
const LEGACY_PROJECT: &str = r#"{
  "project": { "name": "legacy", "timestamp": 1546300800000 },
  "tables": [
    { "id": "6b6f1e2a-8c1f-4b8e-9a57-1d1c2e3f4a01", "name": "User", "timestamp": 1546300800000,
      "position": { "x": 128, "y": 128 }, "options": { "id": true, "timestamps": true } },
    { "id": "6b6f1e2a-8c1f-4b8e-9a57-1d1c2e3f4a02", "name": "Post", "timestamp": 1546300801000 }
  ],
  "fields": [
    { "id": "0f7a3c9e-2d41-4c55-8e6b-7a8b9c0d1e01", "tableID": "6b6f1e2a-8c1f-4b8e-9a57-1d1c2e3f4a01",
      "name": "email", "type": "STRING" },
    { "id": "0f7a3c9e-2d41-4c55-8e6b-7a8b9c0d1e02", "tableID": "6b6f1e2a-8c1f-4b8e-9a57-1d1c2e3f4a02",
      "name": "user_id", "type": "U_INT" }
  ]
}"#;

#[test]
fn test_round_trip_keeps_entities() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blog.json");

    let mut editor = SchemaEditor::new(Config::default(), "blog").unwrap();
    let table = editor.add_table(None).unwrap().created_tables()[0].id;
    let field = editor.add_field(table).unwrap().created_fields()[0].id;
    editor.apply(Mutation::rename_field(field, "user_id")).unwrap();
    editor.apply(Mutation::retype_field(field, FieldType::UInt)).unwrap();
    editor.set_zoom(80);
    editor.save_as(&path).unwrap();

    let loaded = ProjectFile::load(&path).unwrap();
    let (meta, store) = loaded.into_store();

    assert_eq!(&meta, editor.project());
    assert_eq!(meta.zoom, 80);
    assert_eq!(store.tables().collect::<Vec<_>>(), editor.store().tables().collect::<Vec<_>>());
    assert_eq!(store.fields().collect::<Vec<_>>(), editor.store().fields().collect::<Vec<_>>());
    assert_eq!(
        store.relations().collect::<Vec<_>>(),
        editor.store().relations().collect::<Vec<_>>()
    );
    assert_eq!(store.relations().count(), 1);
}

#[test]
fn test_legacy_file_loads_with_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    fs::write(&path, LEGACY_PROJECT).unwrap();

    let file = ProjectFile::load(&path).unwrap();

    assert_eq!(file.project.zoom, 100);
    assert!(file.relations.is_empty());
    assert!(file.tables[1].options.is_empty());
    assert_eq!(file.fields[1].field_type, FieldType::UInt);
}

/// `Post.author` owns a relation its name does not imply
const MISLINKED_PROJECT: &str = r#"{
  "project": { "name": "mislinked", "timestamp": 1546300800000 },
  "tables": [
    { "id": "6b6f1e2a-8c1f-4b8e-9a57-1d1c2e3f4a01", "name": "User", "timestamp": 1546300800000 },
    { "id": "6b6f1e2a-8c1f-4b8e-9a57-1d1c2e3f4a02", "name": "Post", "timestamp": 1546300801000 }
  ],
  "fields": [
    { "id": "0f7a3c9e-2d41-4c55-8e6b-7a8b9c0d1e02", "tableID": "6b6f1e2a-8c1f-4b8e-9a57-1d1c2e3f4a02",
      "name": "author", "type": "U_INT" }
  ],
  "relations": [
    { "id": "3c1d8f0b-5a6e-4f7d-8b9c-0a1b2c3d4e01", "fieldID": "0f7a3c9e-2d41-4c55-8e6b-7a8b9c0d1e02",
      "fromTableID": "6b6f1e2a-8c1f-4b8e-9a57-1d1c2e3f4a02", "toTableID": "6b6f1e2a-8c1f-4b8e-9a57-1d1c2e3f4a01" }
  ]
}"#;

fn inferring_config() -> Config {
    let mut config = Config::default();
    config.editor.infer_relations_on_create = true;
    config
}

#[test]
fn test_validate_on_load_rejects_inconsistent_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mislinked.json");
    fs::write(&path, MISLINKED_PROJECT).unwrap();

    let strict = SchemaEditor::open(Config::default(), &path);
    assert!(matches!(strict, Err(Error::ValidationError(_))));

    let engine = ConsistencyEngine::default();
    assert!(matches!(
        ProjectFile::load_validated(&path, &engine),
        Err(Error::ValidationError(_))
    ));
}

#[test]
fn test_missing_relation_is_tolerated_only_without_create_inference() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    fs::write(&path, LEGACY_PROJECT).unwrap();

    let editor = SchemaEditor::open(Config::default(), &path).unwrap();
    assert_eq!(editor.audit().len(), 1);

    assert!(matches!(
        SchemaEditor::open(inferring_config(), &path),
        Err(Error::ValidationError(_))
    ));
}

#[test]
fn test_saved_session_with_new_foreign_key_field_reopens() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blog.json");

    let mut editor = SchemaEditor::new(Config::default(), "blog").unwrap();
    let table = editor.add_table(None).unwrap().created_tables()[0].id;
    editor
        .apply(Mutation::CreateField {
            table_id: table,
            name: "user_id".to_string(),
            field_type: FieldType::UInt,
        })
        .unwrap();
    editor.save_as(&path).unwrap();

    let reopened = SchemaEditor::open(Config::default(), &path).unwrap();
    assert_eq!(reopened.store(), editor.store());
    assert_eq!(reopened.store().relations().count(), 0);
}

#[test]
fn test_repair_then_reopen_strictly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    fs::write(&path, LEGACY_PROJECT).unwrap();

    let mut lenient = Config::default();
    lenient.project.validate_on_load = false;
    let mut editor = SchemaEditor::open(lenient, &path).unwrap();
    assert_eq!(editor.audit().len(), 1);

    let changes = editor.reconcile().unwrap();
    assert_eq!(changes.created_relations().len(), 1);
    assert!(editor.is_modified());
    editor.save().unwrap();

    let reopened = SchemaEditor::open(inferring_config(), &path).unwrap();
    assert!(reopened.audit().is_empty());
    assert_eq!(reopened.store().relations().count(), 1);
}
