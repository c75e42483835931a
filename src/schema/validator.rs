//! Payload validation against a namespace schema
//!
//! Validation semantics:
//! - Every missing required field is reported, not just the first
//! - Per field, checks run in a fixed order: type, pattern, length, numeric
//!   range, enum, nested properties, array items. Only the first failing
//!   check of a field is reported; other fields are still checked.
//! - Nested properties and array elements count as fields of their own
//! - Fields the schema does not define are accepted and tagged `Unschemad`
//! - `null` on an optional field is accepted
//!
//! The validator never mutates the payload.

use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{ValidationError, ValidationErrors};
use super::registry::SchemaRegistry;
use super::types::{FieldSchema, FieldType, NamespaceSchema};

/// How a stored value relates to its namespace schema at write time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Checked against a field definition and conforming
    Valid,
    /// No definition exists for the field; accepted as-is
    Unschemad,
    /// Filled in from the field's schema default
    Defaulted,
}

/// A payload field that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedField {
    pub value: Value,
    pub status: ValidationStatus,
}

/// A payload that passed validation, bound to the schema it was checked against.
#[derive(Debug, Clone)]
pub struct ValidatedPayload {
    schema: Arc<NamespaceSchema>,
    fields: IndexMap<String, ValidatedField>,
    defaults: IndexMap<String, Value>,
}

impl ValidatedPayload {
    pub fn namespace(&self) -> &str {
        self.schema.namespace()
    }

    /// The exact schema snapshot used for validation
    pub fn schema(&self) -> &Arc<NamespaceSchema> {
        &self.schema
    }

    /// Payload fields in payload order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ValidatedField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field(&self, name: &str) -> Option<&ValidatedField> {
        self.fields.get(name)
    }

    /// The field definition a payload field was checked against
    pub fn field_schema(&self, name: &str) -> Option<&FieldSchema> {
        self.schema.field(name)
    }

    /// Names of fields the schema does not define
    pub fn unschemad(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, f)| f.status == ValidationStatus::Unschemad)
            .map(|(k, _)| k.as_str())
    }

    /// Schema defaults for optional fields the payload left out
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.defaults.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Schema validator backed by a registry.
///
/// Each call validates against one registry snapshot, so a concurrent reload
/// is either fully visible or not at all.
pub struct SchemaValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a new validator backed by the given registry.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validates a raw payload for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns every problem found: a single `UnknownNamespace` when no schema
    /// is registered, otherwise all missing fields and all per-field failures.
    pub fn validate(&self, namespace: &str, payload: &Value) -> Result<ValidatedPayload, ValidationErrors> {
        let schema = self.registry.get_schema(namespace).map_err(|_| {
            ValidationErrors::new(vec![ValidationError::UnknownNamespace {
                namespace: namespace.to_string(),
            }])
        })?;
        validate_against(schema, payload)
    }
}

/// Validates a payload against a specific schema snapshot.
pub fn validate_against(schema: Arc<NamespaceSchema>, payload: &Value) -> Result<ValidatedPayload, ValidationErrors> {
    let obj = payload.as_object().ok_or_else(|| {
        ValidationErrors::new(vec![ValidationError::TypeMismatch {
            path: "$root".into(),
            expected: "object",
            actual: json_type_name(payload),
        }])
    })?;

    let mut errors = Vec::new();
    for field in schema.fields() {
        match obj.get(&field.name) {
            None | Some(Value::Null) => {
                if schema.is_required(&field.name) {
                    errors.push(ValidationError::MissingRequiredField {
                        path: field.name.clone(),
                    });
                }
            }
            Some(value) => check_value(field, value, &field.name, &mut errors),
        }
    }

    if !errors.is_empty() {
        return Err(ValidationErrors::new(errors));
    }

    let fields = obj
        .iter()
        .map(|(name, value)| {
            let status = if schema.field(name).is_some() {
                ValidationStatus::Valid
            } else {
                ValidationStatus::Unschemad
            };
            (
                name.clone(),
                ValidatedField {
                    value: value.clone(),
                    status,
                },
            )
        })
        .collect();

    let defaults = schema
        .fields()
        .filter(|f| !obj.contains_key(&f.name))
        .filter_map(|f| f.constraints.default.clone().map(|d| (f.name.clone(), d)))
        .collect();

    Ok(ValidatedPayload {
        schema,
        fields,
        defaults,
    })
}

/// Checks one non-absent value against its field schema, appending at most
/// one error for the field itself plus any errors from nested fields.
pub(crate) fn check_value(field: &FieldSchema, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    if !type_matches(&field.field_type, value) {
        errors.push(ValidationError::TypeMismatch {
            path: path.to_string(),
            expected: field.type_name(),
            actual: describe_actual(&field.field_type, value),
        });
        return;
    }

    if let Some(err) = first_constraint_violation(field, value, path) {
        errors.push(err);
        return;
    }

    match &field.field_type {
        FieldType::Object { properties } => {
            if let Some(obj) = value.as_object() {
                check_properties(properties.values(), obj, path, errors);
            }
        }
        FieldType::Array { items } => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}[{}]", path, i);
                    check_value(items, elem, &elem_path, errors);
                }
            }
        }
        _ => {}
    }
}

fn check_properties<'s>(
    properties: impl Iterator<Item = &'s FieldSchema>,
    obj: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    for prop in properties {
        let prop_path = format!("{}.{}", path, prop.name);
        match obj.get(&prop.name) {
            None | Some(Value::Null) => {
                if prop.required {
                    errors.push(ValidationError::MissingRequiredField { path: prop_path });
                }
            }
            Some(v) => check_value(prop, v, &prop_path, errors),
        }
    }
}

fn type_matches(field_type: &FieldType, value: &Value) -> bool {
    match field_type {
        FieldType::String => value.is_string(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Date => value.as_str().map_or(false, is_iso_date),
        FieldType::Object { .. } => value.is_object(),
        FieldType::Array { .. } => value.is_array(),
    }
}

fn is_iso_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn describe_actual(expected: &FieldType, value: &Value) -> &'static str {
    match (expected, value) {
        (FieldType::Date, Value::String(_)) => "non-ISO-8601 string",
        _ => json_type_name(value),
    }
}

fn first_constraint_violation(field: &FieldSchema, value: &Value, path: &str) -> Option<ValidationError> {
    let c = &field.constraints;

    if let (Some(pattern), Some(text)) = (&c.pattern, value.as_str()) {
        if !pattern.is_full_match(text) {
            return Some(ValidationError::PatternMismatch {
                path: path.to_string(),
                pattern: pattern.source().to_string(),
            });
        }
    }

    if let Some(text) = value.as_str() {
        let length = text.chars().count();
        let too_short = c.min_length.map_or(false, |min| length < min);
        let too_long = c.max_length.map_or(false, |max| length > max);
        if too_short || too_long {
            return Some(ValidationError::LengthOutOfRange {
                path: path.to_string(),
                length,
                min: c.min_length,
                max: c.max_length,
            });
        }
    }

    if let Some(n) = value.as_f64() {
        let below = c.minimum.map_or(false, |min| n < min);
        let above = c.maximum.map_or(false, |max| n > max);
        if below || above {
            return Some(ValidationError::NumberOutOfRange {
                path: path.to_string(),
                value: n,
                minimum: c.minimum,
                maximum: c.maximum,
            });
        }
    }

    if let Some(allowed) = &c.allowed {
        if !allowed.iter().any(|a| enum_member_eq(a, value)) {
            return Some(ValidationError::NotInEnum {
                path: path.to_string(),
                value: value.clone(),
                allowed: allowed.clone(),
            });
        }
    }

    None
}

/// Exact, case-sensitive membership. Numbers compare by value so `1` matches `1.0`.
fn enum_member_eq(allowed: &Value, value: &Value) -> bool {
    match (allowed, value) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => allowed == value,
    }
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
