//! Schema Invariant Tests
//!
//! - Validation is deterministic
//! - Every failing field is reported, one error per field
//! - The errors are exactly the union of missing and broken fields
//! - Fields without a definition are accepted and tagged, never rejected
//! - A malformed definition is rejected alone; the rest still load
//! - A reload is all or nothing

use std::fs;
use std::sync::Arc;

use extfield::schema::{
    DocumentFormat, SchemaErrorCode, SchemaRegistry, SchemaValidator, ValidationStatus,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry
        .load_schema(
            "epic",
            &json!({
                "fields": {
                    "external_id": {
                        "type": "string",
                        "required": true,
                        "validation": { "pattern": "[A-Z0-9]{8}" }
                    },
                    "age": {
                        "type": "number",
                        "validation": { "minimum": 0, "maximum": 130 }
                    },
                    "department": { "type": "string", "enum": ["cardiology", "oncology"] },
                    "address": {
                        "type": "object",
                        "properties": {
                            "city": { "type": "string", "required": true },
                            "zip": { "type": "string", "validation": { "pattern": "[0-9]{5}" } }
                        }
                    },
                    "allergies": {
                        "type": "array",
                        "items": { "type": "string", "validation": { "min_length": 2 } }
                    }
                }
            }),
        )
        .unwrap();
    registry
}

const WIDTH: usize = 6;

/// `r0..r5` are required strings; `n0..n5` are optional numbers up to 10
fn aggregation_registry() -> SchemaRegistry {
    let mut fields = Map::new();
    for i in 0..WIDTH {
        fields.insert(format!("r{}", i), json!({ "type": "string", "required": true }));
        fields.insert(
            format!("n{}", i),
            json!({ "type": "number", "validation": { "minimum": 0, "maximum": 10 } }),
        );
    }
    let registry = SchemaRegistry::new();
    registry
        .load_schema("epic", &json!({ "fields": Value::Object(fields) }))
        .unwrap();
    registry
}

// =============================================================================
// Determinism
// =============================================================================

/// Same payload validates the same way every time.
#[test]
fn test_validation_is_deterministic() {
    let registry = setup_registry();
    let validator = SchemaValidator::new(&registry);
    let good = json!({ "external_id": "ABC12345", "age": 40 });
    let bad = json!({ "external_id": "abc", "age": -1 });

    let first_errors = validator.validate("epic", &bad).unwrap_err();
    for _ in 0..100 {
        assert!(validator.validate("epic", &good).is_ok());
        assert_eq!(validator.validate("epic", &bad).unwrap_err(), first_errors);
    }
}

// =============================================================================
// Error Completeness
// =============================================================================

/// Every failing field produces exactly one error.
#[test]
fn test_all_failures_reported() {
    let registry = setup_registry();
    let validator = SchemaValidator::new(&registry);

    let errors = validator
        .validate(
            "epic",
            &json!({
                "age": "forty",
                "department": "dermatology",
                "allergies": ["ok", "x"]
            }),
        )
        .unwrap_err();

    let mut paths: Vec<&str> = errors.iter().map(|e| e.path()).collect();
    paths.sort();
    assert_eq!(paths, ["age", "allergies[1]", "department", "external_id"]);

    let codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
    assert!(codes.contains(&"MISSING_REQUIRED_FIELD"));
    assert!(codes.contains(&"TYPE_MISMATCH"));
    assert!(codes.contains(&"NOT_IN_ENUM"));
    assert!(codes.contains(&"LENGTH_OUT_OF_RANGE"));
}

/// Pattern applies to the whole value.
#[test]
fn test_pattern_is_anchored() {
    let registry = setup_registry();
    let validator = SchemaValidator::new(&registry);

    assert!(validator.validate("epic", &json!({ "external_id": "ABC12345" })).is_ok());
    for bad in ["abc12345", "ABC123", "ABC123456", "XABC12345"] {
        let errors = validator
            .validate("epic", &json!({ "external_id": bad }))
            .unwrap_err();
        assert_eq!(errors.len(), 1, "value {}", bad);
        assert_eq!(errors.iter().next().map(|e| e.code()), Some("PATTERN_MISMATCH"));
    }
}

/// Patterns written with their own anchors behave the same.
#[test]
fn test_explicitly_anchored_pattern() {
    let registry = SchemaRegistry::new();
    registry
        .load_schema(
            "cerner",
            &json!({ "fields": { "mrn": {
                "type": "string",
                "required": true,
                "validation": { "pattern": "^[0-9]{10}$" }
            } } }),
        )
        .unwrap();
    let validator = SchemaValidator::new(&registry);

    assert!(validator.validate("cerner", &json!({ "mrn": "1234567890" })).is_ok());
    let errors = validator.validate("cerner", &json!({ "mrn": "12" })).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.for_path("mrn").next().map(|e| e.code()), Some("PATTERN_MISMATCH"));
}

/// Nested failures carry dotted paths.
#[test]
fn test_nested_paths() {
    let registry = setup_registry();
    let validator = SchemaValidator::new(&registry);

    let errors = validator
        .validate(
            "epic",
            &json!({ "external_id": "ABC12345", "address": { "zip": "12" } }),
        )
        .unwrap_err();

    let mut paths: Vec<&str> = errors.iter().map(|e| e.path()).collect();
    paths.sort();
    assert_eq!(paths, ["address.city", "address.zip"]);
}

/// A required field set to null counts as missing.
#[test]
fn test_null_required_is_missing() {
    let registry = setup_registry();
    let validator = SchemaValidator::new(&registry);

    let errors = validator
        .validate("epic", &json!({ "external_id": null }))
        .unwrap_err();
    assert_eq!(errors.iter().next().map(|e| e.code()), Some("MISSING_REQUIRED_FIELD"));
}

/// Non-object payloads are rejected at the root.
#[test]
fn test_non_object_payload() {
    let registry = setup_registry();
    let validator = SchemaValidator::new(&registry);

    let errors = validator.validate("epic", &json!(["ABC12345"])).unwrap_err();
    assert_eq!(errors.iter().next().map(|e| e.path()), Some("$root"));
}

// =============================================================================
// Unschema'd Fields
// =============================================================================

#[test]
fn test_unschemad_fields_accepted_and_tagged() {
    let registry = setup_registry();
    let validator = SchemaValidator::new(&registry);

    let validated = validator
        .validate(
            "epic",
            &json!({ "external_id": "ABC12345", "loyalty_tier": "gold" }),
        )
        .unwrap();

    assert_eq!(validated.field("external_id").map(|f| f.status), Some(ValidationStatus::Valid));
    assert_eq!(
        validated.field("loyalty_tier").map(|f| f.status),
        Some(ValidationStatus::Unschemad)
    );
    assert_eq!(validated.unschemad().collect::<Vec<_>>(), ["loyalty_tier"]);
}

#[test]
fn test_unknown_namespace() {
    let registry = setup_registry();
    let validator = SchemaValidator::new(&registry);

    let errors = validator.validate("athena", &json!({})).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.iter().next().map(|e| e.code()), Some("UNKNOWN_NAMESPACE"));
}

// =============================================================================
// Loading
// =============================================================================

/// One broken namespace does not stop the others.
#[test]
fn test_malformed_namespace_rejected_alone() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("a_cerner.yaml"),
        "namespace: cerner\nfields:\n  is_active:\n    type: boolean\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("b_epic.yaml"),
        "namespace: epic\nfields:\n  mrn:\n    type: integer\n",
    )
    .unwrap();
    fs::write(tmp.path().join("c_notes.txt"), "ignored").unwrap();

    let registry = SchemaRegistry::new();
    let report = registry.load_dir(tmp.path()).unwrap();

    assert_eq!(report.loaded, ["cerner"]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].code(), SchemaErrorCode::MalformedSchema);
    assert!(registry.contains("cerner"));
    assert!(!registry.contains("epic"));
}

/// The first file to define a namespace keeps it.
#[test]
fn test_duplicate_namespace_across_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("a.yaml"),
        "namespace: epic\nfields:\n  mrn:\n    type: string\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("b.json"),
        r#"{"namespace": "epic", "fields": {"mrn": {"type": "number"}}}"#,
    )
    .unwrap();

    let registry = SchemaRegistry::new();
    let report = registry.load_dir(tmp.path()).unwrap();

    assert_eq!(report.loaded, ["epic"]);
    assert_eq!(report.rejected.len(), 1);
    let schema = registry.get_schema("epic").unwrap();
    assert_eq!(schema.field("mrn").map(|f| f.type_name()), Some("string"));
}

#[test]
fn test_missing_directory_is_unreadable() {
    let tmp = TempDir::new().unwrap();
    let registry = SchemaRegistry::new();
    let err = registry.load_dir(&tmp.path().join("missing")).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::UnreadableDocument);
}

/// A rejected reload leaves the previous schema in place.
#[test]
fn test_failed_reload_keeps_previous() {
    let registry = setup_registry();
    let before = registry.get_schema("epic").unwrap();

    let result = registry.load_schema("epic", &json!({ "fields": { "x": { "type": "object" } } }));
    assert!(result.is_err());

    let after = registry.get_schema("epic").unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

/// A snapshot taken before a reload keeps validating against the old schema.
#[test]
fn test_snapshot_survives_reload() {
    let registry = setup_registry();
    let snapshot = registry.snapshot();

    registry
        .load_document(
            "inline",
            "namespace: epic\nfields:\n  mrn:\n    type: string\n    required: true\n",
            DocumentFormat::Yaml,
        )
        .unwrap();

    assert!(snapshot["epic"].field("external_id").is_some());
    assert!(registry.get_schema("epic").unwrap().field("external_id").is_none());
}

#[test]
fn test_unload() {
    let registry = setup_registry();
    assert!(registry.unload("epic"));
    assert!(!registry.unload("epic"));
    assert!(registry.is_empty());
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Any mix of missing required fields and out-of-range values is reported
    /// as exactly that set of paths.
    #[test]
    fn errors_are_union_of_failures(
        missing in proptest::collection::vec(any::<bool>(), WIDTH),
        broken in proptest::collection::vec(any::<bool>(), WIDTH)
    ) {
        let registry = aggregation_registry();
        let validator = SchemaValidator::new(&registry);

        let mut payload = Map::new();
        let mut expected = Vec::new();
        for i in 0..WIDTH {
            if missing[i] {
                expected.push(format!("r{}", i));
            } else {
                payload.insert(format!("r{}", i), json!("present"));
            }
            if broken[i] {
                payload.insert(format!("n{}", i), json!(99));
                expected.push(format!("n{}", i));
            } else {
                payload.insert(format!("n{}", i), json!(5));
            }
        }
        expected.sort();

        match validator.validate("epic", &Value::Object(payload)) {
            Ok(_) => prop_assert!(expected.is_empty()),
            Err(errors) => {
                let mut paths: Vec<String> = errors.iter().map(|e| e.path().to_string()).collect();
                paths.sort();
                prop_assert_eq!(errors.len(), expected.len());
                prop_assert_eq!(paths, expected);
            }
        }
    }
}
