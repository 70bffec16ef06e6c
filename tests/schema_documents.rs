//! Schema document handling through the file layer: comment-tolerant
//! parsing, the legacy `dict` spelling, and write-side round-trips.

use scribe::{Schema, ScribeError};
use tempfile::TempDir;

#[test]
fn schema_file_with_comments_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema.json");
    std::fs::write(
        &path,
        r#"
        // lattice configuration header
        {
            "schema_name": "header",
            "type": "record",
            "items": [
                {"key": "beta", "type": "float64"},       // gauge coupling
                {"key": "dims", "type": "array", "shape": [4],
                 "elements": {"type": "uint32"}}          /* Nt Nx Ny Nz */
            ]
        }
        "#,
    )
    .unwrap();

    let schema = Schema::from_file(&path).unwrap();
    assert_eq!(schema.name(), "header");
    assert_eq!(schema.type_name(), "record");
}

#[test]
fn legacy_dict_file_reads_and_writes_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.json");
    std::fs::write(
        &path,
        r#"{"type": "dict", "items": [{"key": "n", "type": "int64"}]}"#,
    )
    .unwrap();

    let schema = Schema::from_file(&path).unwrap();
    let emitted = schema.to_value();
    assert_eq!(emitted["type"], "record");

    // and the rewritten document loads back to the same schema
    let reloaded = Schema::from_value(&emitted).unwrap();
    assert_eq!(reloaded.to_value(), emitted);
}

#[test]
fn serialized_schema_reloads_identically() {
    let text = r#"
    {
        "schema_name": "run",
        "schema_description": "one HMC run",
        "type": "record",
        "items": [
            {"key": "trajectories", "type": "uint64"},
            {"key": "acceptance", "type": "float64"},
            {"key": "polyakov", "type": "complex128"},
            {"key": "notes", "optional": true, "type": "string", "max_length": 256}
        ]
    }
    "#;
    let schema = Schema::from_text(text).unwrap();
    let reloaded = Schema::from_text(&schema.to_json_string()).unwrap();
    assert_eq!(schema.to_value(), reloaded.to_value());
    assert_eq!(reloaded.description(), "one HMC run");
}

#[test]
fn missing_schema_file_is_read_error() {
    let err = Schema::from_file("does/not/exist.json").unwrap_err();
    assert!(matches!(err, ScribeError::Read(_)));
}

#[test]
fn malformed_documents_are_rejected() {
    for (text, expect_validation) in [
        (r#"{"type": "float16"}"#, true),
        (r#"{"type": "array"}"#, true),
        (r#"{"type": "record"}"#, true),
        (r#"{"type": "string", "min_length": 9, "max_length": 3}"#, true),
        (r#"["not", "an", "object"]"#, true),
        (r#"{"type":"#, false),
    ] {
        let err = Schema::from_text(text).unwrap_err();
        match err {
            ScribeError::Validation(_) => assert!(expect_validation, "for {}", text),
            ScribeError::Read(_) => assert!(!expect_validation, "for {}", text),
            other => panic!("unexpected error kind {:?} for {}", other, text),
        }
    }
}
