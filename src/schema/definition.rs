//! Declarative schema definitions and their compilation into typed schemas
//!
//! Two document shapes are accepted:
//!
//! ```yaml
//! # grouped: one namespace per document
//! namespace: epic
//! description: Epic EHR
//! fields:
//!   mrn:
//!     type: string
//!     required: true
//!     validation:
//!       pattern: "[0-9]{10}"
//! ```
//!
//! ```yaml
//! # flat: each entry names its own namespace
//! fields:
//!   - name: external_id
//!     namespace: epic
//!     type: string
//!   - name: is_active
//!     namespace: cerner
//!     type: boolean
//! ```
//!
//! `fields` may be a mapping or a list in either shape. List entries without
//! a `namespace` inherit the document's.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::{Constraints, FieldKind, FieldSchema, FieldType, NamespaceSchema, Pattern};
use super::validator::check_value;

/// A whole definition document as written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: RawFields,
    /// Extra required names; in a flat document they are `namespace.field`
    #[serde(default, alias = "required")]
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFields {
    Map(IndexMap<String, RawField>),
    List(Vec<RawField>),
}

impl Default for RawFields {
    fn default() -> Self {
        RawFields::Map(IndexMap::new())
    }
}

/// One field entry as written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawField {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub validation: Option<RawValidation>,
    // The following may also sit beside `type` instead of under `validation`.
    #[serde(default, rename = "enum")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub properties: Option<IndexMap<String, RawField>>,
    #[serde(default)]
    pub items: Option<Box<RawField>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawValidation {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default, rename = "enum")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub properties: Option<IndexMap<String, RawField>>,
    #[serde(default)]
    pub items: Option<Box<RawField>>,
    #[serde(default)]
    pub default: Option<Value>,
}

/// Outcome of compiling one document: namespaces are compiled independently,
/// so one bad namespace does not take the others down.
#[derive(Debug, Default)]
pub struct CompiledDocument {
    pub schemas: Vec<NamespaceSchema>,
    pub rejected: Vec<SchemaError>,
}

/// Compiles a definition for one known namespace (`load_schema`).
pub fn compile_namespace(namespace: &str, raw: RawDocument) -> SchemaResult<NamespaceSchema> {
    if let Some(declared) = raw.namespace.as_deref() {
        if declared != namespace {
            return Err(SchemaError::malformed(
                Some(namespace),
                format!("definition declares namespace '{}'", declared),
            ));
        }
    }

    let description = raw.description.unwrap_or_default();
    let mut fields = Vec::new();
    for (name, entry) in flatten_entries(raw.fields, Some(namespace))? {
        let entry_ns = entry.namespace.clone().unwrap_or_else(|| namespace.to_string());
        if entry_ns != namespace {
            return Err(SchemaError::malformed_field(
                namespace,
                &name,
                format!("entry declares namespace '{}'", entry_ns),
            ));
        }
        fields.push(compile_field(namespace, &name, &name, entry)?);
    }

    NamespaceSchema::new(namespace, description, fields, &raw.required_fields)
}

/// Compiles every namespace a document defines, grouped or flat.
pub fn compile_document(raw: RawDocument) -> CompiledDocument {
    let mut out = CompiledDocument::default();
    let doc_ns = raw.namespace.clone();

    let entries = match flatten_entries(raw.fields, doc_ns.as_deref()) {
        Ok(entries) => entries,
        Err(e) => {
            out.rejected.push(e);
            return out;
        }
    };

    // Group by namespace, keeping first-appearance order.
    let mut groups: IndexMap<String, Vec<(String, RawField)>> = IndexMap::new();
    if let Some(ns) = &doc_ns {
        groups.entry(ns.clone()).or_default();
    }
    for (name, entry) in entries {
        match entry.namespace.clone().or_else(|| doc_ns.clone()) {
            Some(ns) => groups.entry(ns).or_default().push((name, entry)),
            None => out.rejected.push(SchemaError::malformed(
                None,
                format!("field '{}' has no namespace", name),
            )),
        }
    }

    let mut required: IndexMap<String, Vec<String>> = IndexMap::new();
    for name in raw.required_fields {
        match (&doc_ns, name.split_once('.')) {
            (Some(ns), _) => required.entry(ns.clone()).or_default().push(name),
            (None, Some((ns, field))) => {
                required.entry(ns.to_string()).or_default().push(field.to_string())
            }
            (None, None) => out.rejected.push(SchemaError::malformed(
                None,
                format!("required name '{}' is not namespace-qualified", name),
            )),
        }
    }

    for (ns, names) in &required {
        if !groups.contains_key(ns) {
            out.rejected.push(SchemaError::malformed(
                Some(ns),
                format!("required list references undefined fields {:?}", names),
            ));
        }
    }

    let description = raw.description.unwrap_or_default();
    for (ns, entries) in groups {
        let extra = required.get(&ns).cloned().unwrap_or_default();
        let desc = if Some(&ns) == doc_ns.as_ref() {
            description.clone()
        } else {
            String::new()
        };
        match compile_group(&ns, desc, entries, &extra) {
            Ok(schema) => out.schemas.push(schema),
            Err(e) => out.rejected.push(e),
        }
    }

    out
}

fn compile_group(
    namespace: &str,
    description: String,
    entries: Vec<(String, RawField)>,
    extra_required: &[String],
) -> SchemaResult<NamespaceSchema> {
    let mut fields = Vec::with_capacity(entries.len());
    for (name, entry) in entries {
        fields.push(compile_field(namespace, &name, &name, entry)?);
    }
    NamespaceSchema::new(namespace, description, fields, extra_required)
}

/// Normalizes map and list forms into (name, entry) pairs.
fn flatten_entries(fields: RawFields, namespace: Option<&str>) -> SchemaResult<Vec<(String, RawField)>> {
    match fields {
        RawFields::Map(map) => Ok(map.into_iter().collect()),
        RawFields::List(list) => list
            .into_iter()
            .enumerate()
            .map(|(i, entry)| match entry.name.clone() {
                Some(name) => Ok((name, entry)),
                None => Err(SchemaError::malformed(
                    namespace,
                    format!("field entry #{} has no name", i),
                )),
            })
            .collect(),
    }
}

/// Compiles one field, recursing into object properties and array items.
///
/// `path` is the dotted location used in error messages.
fn compile_field(namespace: &str, name: &str, path: &str, raw: RawField) -> SchemaResult<FieldSchema> {
    let type_name = raw
        .field_type
        .as_deref()
        .ok_or_else(|| SchemaError::malformed_field(namespace, path, "field lacks a type"))?;
    let kind = FieldKind::parse(type_name).ok_or_else(|| {
        SchemaError::malformed_field(
            namespace,
            path,
            format!("unrecognized type '{}'", type_name),
        )
    })?;

    let validation = raw.validation.unwrap_or_default();
    let allowed = validation.allowed.or(raw.allowed);
    let default = validation.default.or(raw.default);
    let properties = validation.properties.or(raw.properties);
    let items = validation.items.or(raw.items);

    if kind != FieldKind::Object && properties.is_some() {
        return Err(SchemaError::malformed_field(
            namespace,
            path,
            format!("properties only apply to object fields, not {}", kind),
        ));
    }
    if kind != FieldKind::Array && items.is_some() {
        return Err(SchemaError::malformed_field(
            namespace,
            path,
            format!("items only apply to array fields, not {}", kind),
        ));
    }

    let field_type = match kind {
        FieldKind::String => FieldType::String,
        FieldKind::Number => FieldType::Number,
        FieldKind::Boolean => FieldType::Boolean,
        FieldKind::Date => FieldType::Date,
        FieldKind::Object => {
            let props = properties.ok_or_else(|| {
                SchemaError::malformed_field(namespace, path, "object field lacks properties")
            })?;
            let mut compiled = indexmap::IndexMap::with_capacity(props.len());
            for (prop_name, prop) in props {
                let prop_path = format!("{}.{}", path, prop_name);
                let schema = compile_field(namespace, &prop_name, &prop_path, prop)?;
                compiled.insert(prop_name, schema);
            }
            FieldType::Object {
                properties: compiled,
            }
        }
        FieldKind::Array => {
            let item = items.ok_or_else(|| {
                SchemaError::malformed_field(namespace, path, "array field lacks items")
            })?;
            let item_name = format!("{}[]", name);
            let item_path = format!("{}[]", path);
            FieldType::Array {
                items: Box::new(compile_field(namespace, &item_name, &item_path, *item)?),
            }
        }
    };

    let constraints = compile_constraints(
        namespace,
        path,
        kind,
        ConstraintInput {
            pattern: validation.pattern,
            min_length: validation.min_length,
            max_length: validation.max_length,
            minimum: validation.minimum,
            maximum: validation.maximum,
            allowed,
        },
    )?;

    let mut field = FieldSchema {
        name: name.to_string(),
        namespace: namespace.to_string(),
        description: raw.description.unwrap_or_default(),
        required: raw.required,
        field_type,
        constraints,
    };

    if let Some(value) = default {
        let mut problems = Vec::new();
        check_value(&field, &value, path, &mut problems);
        if let Some(first) = problems.first() {
            return Err(SchemaError::malformed_field(
                namespace,
                path,
                format!("default does not conform: {}", first),
            ));
        }
        field.constraints.default = Some(value);
    }

    Ok(field)
}

struct ConstraintInput {
    pattern: Option<String>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    allowed: Option<Vec<Value>>,
}

fn compile_constraints(
    namespace: &str,
    path: &str,
    kind: FieldKind,
    input: ConstraintInput,
) -> SchemaResult<Constraints> {
    let malformed = |reason: String| SchemaError::malformed_field(namespace, path, reason);

    let pattern = match input.pattern {
        Some(_) if !kind.is_textual() => {
            return Err(malformed(format!("pattern does not apply to {}", kind)))
        }
        Some(src) => Some(
            Pattern::compile(&src).map_err(|e| malformed(format!("invalid pattern: {}", e)))?,
        ),
        None => None,
    };

    if (input.min_length.is_some() || input.max_length.is_some()) && !kind.is_textual() {
        return Err(malformed(format!("length bounds do not apply to {}", kind)));
    }
    if let (Some(lo), Some(hi)) = (input.min_length, input.max_length) {
        if lo > hi {
            return Err(malformed(format!("min_length {} exceeds max_length {}", lo, hi)));
        }
    }

    if (input.minimum.is_some() || input.maximum.is_some()) && kind != FieldKind::Number {
        return Err(malformed(format!("numeric range does not apply to {}", kind)));
    }
    for bound in [input.minimum, input.maximum].into_iter().flatten() {
        if !bound.is_finite() {
            return Err(malformed("numeric bounds must be finite".to_string()));
        }
    }
    if let (Some(lo), Some(hi)) = (input.minimum, input.maximum) {
        if lo > hi {
            return Err(malformed(format!("minimum {} exceeds maximum {}", lo, hi)));
        }
    }

    if let Some(values) = &input.allowed {
        let fits = match kind {
            FieldKind::String => values.iter().all(Value::is_string),
            FieldKind::Number => values.iter().all(Value::is_number),
            other => {
                return Err(malformed(format!(
                    "enum only applies to string or number fields, not {}",
                    other
                )))
            }
        };
        if !fits {
            return Err(malformed(format!("enum values must all be of type {}", kind)));
        }
        if values.is_empty() {
            return Err(malformed("enum must list at least one value".to_string()));
        }
    }

    Ok(Constraints {
        pattern,
        min_length: input.min_length,
        max_length: input.max_length,
        minimum: input.minimum,
        maximum: input.maximum,
        allowed: input.allowed,
        default: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_grouped_document_compiles() {
        let doc = raw(json!({
            "namespace": "epic",
            "description": "Epic EHR",
            "fields": {
                "mrn": {
                    "type": "string",
                    "required": true,
                    "validation": { "pattern": "[0-9]{10}" }
                },
                "status": {
                    "type": "string",
                    "validation": { "enum": ["active", "inactive"] }
                }
            }
        }));
        let schema = compile_namespace("epic", doc).unwrap();
        assert_eq!(schema.description(), "Epic EHR");
        assert!(schema.is_required("mrn"));
        let mrn = schema.field("mrn").unwrap();
        assert_eq!(mrn.constraints.pattern.as_ref().unwrap().source(), "[0-9]{10}");
    }

    #[test]
    fn test_flat_document_splits_namespaces() {
        let doc = raw(json!({
            "fields": [
                { "name": "external_id", "namespace": "epic", "type": "string", "required": true },
                { "name": "is_active", "namespace": "cerner", "type": "boolean" },
                { "name": "mrn", "namespace": "epic", "type": "string" }
            ]
        }));
        let compiled = compile_document(doc);
        assert!(compiled.rejected.is_empty());
        let names: Vec<&str> = compiled.schemas.iter().map(|s| s.namespace()).collect();
        assert_eq!(names, ["epic", "cerner"]);
        assert_eq!(compiled.schemas[0].field_count(), 2);
    }

    #[test]
    fn test_bad_namespace_does_not_reject_others() {
        let doc = raw(json!({
            "fields": [
                { "name": "mrn", "namespace": "cerner", "type": "string" },
                { "name": "broken", "namespace": "epic" }
            ]
        }));
        let compiled = compile_document(doc);
        assert_eq!(compiled.schemas.len(), 1);
        assert_eq!(compiled.schemas[0].namespace(), "cerner");
        assert_eq!(compiled.rejected.len(), 1);
        assert_eq!(compiled.rejected[0].namespace(), Some("epic"));
    }

    #[test]
    fn test_structural_rejections() {
        let cases = [
            json!({ "fields": { "x": { "description": "no type" } } }),
            json!({ "fields": { "x": { "type": "integer" } } }),
            json!({ "fields": { "x": { "type": "boolean", "enum": [true] } } }),
            json!({ "fields": { "x": { "type": "object" } } }),
            json!({ "fields": { "x": { "type": "array" } } }),
            json!({ "fields": { "x": { "type": "string", "validation": { "pattern": "(" } } } }),
            json!({ "fields": { "x": { "type": "string", "validation": { "min_length": 5, "max_length": 2 } } } }),
            json!({ "fields": { "x": { "type": "number", "validation": { "pattern": "[0-9]+" } } } }),
            json!({ "fields": { "x": { "type": "string", "validation": { "minimum": 1 } } } }),
            json!({ "fields": { "x": { "type": "string" } }, "required_fields": ["y"] }),
            json!({ "fields": { "x": { "type": "string", "items": { "type": "string" } } } }),
        ];
        for case in cases {
            let result = compile_namespace("epic", raw(case.clone()));
            assert!(result.is_err(), "expected rejection for {}", case);
        }
    }

    #[test]
    fn test_nested_object_and_array_compile() {
        let doc = raw(json!({
            "fields": {
                "address": {
                    "type": "object",
                    "validation": {
                        "properties": {
                            "city": { "type": "string", "required": true },
                            "geo": {
                                "type": "object",
                                "properties": { "lat": { "type": "number" } }
                            }
                        }
                    }
                },
                "allergies": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "code": { "type": "string" } }
                    }
                }
            }
        }));
        let schema = compile_namespace("hint", doc).unwrap();
        match &schema.field("address").unwrap().field_type {
            FieldType::Object { properties } => {
                assert!(properties["city"].required);
                assert_eq!(properties["geo"].type_name(), "object");
            }
            other => panic!("unexpected type {:?}", other),
        }
        match &schema.field("allergies").unwrap().field_type {
            FieldType::Array { items } => assert_eq!(items.type_name(), "object"),
            other => panic!("unexpected type {:?}", other),
        }
    }

    #[test]
    fn test_nested_error_reports_path() {
        let doc = raw(json!({
            "fields": {
                "address": {
                    "type": "object",
                    "properties": { "zip": { "description": "missing type" } }
                }
            }
        }));
        let err = compile_namespace("hint", doc).unwrap_err();
        assert_eq!(err.field(), Some("address.zip"));
    }

    #[test]
    fn test_default_must_conform() {
        let doc = raw(json!({
            "fields": {
                "language": {
                    "type": "string",
                    "enum": ["en", "es"],
                    "default": "fr"
                }
            }
        }));
        assert!(compile_namespace("hint", doc).is_err());

        let doc = raw(json!({
            "fields": {
                "language": { "type": "string", "enum": ["en", "es"], "default": "en" }
            }
        }));
        let schema = compile_namespace("hint", doc).unwrap();
        assert_eq!(
            schema.field("language").unwrap().constraints.default,
            Some(json!("en"))
        );
    }

    #[test]
    fn test_declared_namespace_must_match() {
        let doc = raw(json!({ "namespace": "cerner", "fields": {} }));
        assert!(compile_namespace("epic", doc).is_err());
    }
}
