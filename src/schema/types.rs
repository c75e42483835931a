//! Compiled schema types
//!
//! Supported field types (closed taxonomy):
//! - string: UTF-8 string
//! - number: any JSON number
//! - boolean: true or false
//! - date: ISO-8601 calendar date string (YYYY-MM-DD)
//! - object: nested object with its own property schemas
//! - array: homogeneous array with a single item schema
//!
//! Schemas are immutable once built. Reloading a namespace builds a new
//! `NamespaceSchema` and swaps it in.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};

/// Type tags, used when parsing `type:` strings from definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
}

impl FieldKind {
    /// Parses a definition's `type` string. Case-sensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(FieldKind::String),
            "number" => Some(FieldKind::Number),
            "boolean" => Some(FieldKind::Boolean),
            "date" => Some(FieldKind::Date),
            "object" => Some(FieldKind::Object),
            "array" => Some(FieldKind::Array),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Object => "object",
            FieldKind::Array => "array",
        }
    }

    /// Whether textual constraints (pattern, length) apply
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldKind::String | FieldKind::Date)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field type with nested shapes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    /// Nested object; every property is itself a full field schema
    Object {
        properties: IndexMap<String, FieldSchema>,
    },
    /// Homogeneous array (boxed to allow recursive types)
    Array { items: Box<FieldSchema> },
}

impl FieldType {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldType::String => FieldKind::String,
            FieldType::Number => FieldKind::Number,
            FieldType::Boolean => FieldKind::Boolean,
            FieldType::Date => FieldKind::Date,
            FieldType::Object { .. } => FieldKind::Object,
            FieldType::Array { .. } => FieldKind::Array,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// A regex compiled with full-match (anchored) semantics.
///
/// The source is kept as written so it can be reported back verbatim.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_full_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Value constraints, applied in declaration order by the validator:
/// pattern, length, numeric range, enum.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }
}

/// A single field definition within a namespace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub name: String,
    pub namespace: String,
    pub description: String,
    pub required: bool,
    #[serde(flatten)]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

impl FieldSchema {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            description: String::new(),
            required: false,
            field_type,
            constraints: Constraints::default(),
        }
    }

    pub fn string(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, FieldType::String)
    }

    pub fn number(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, FieldType::Number)
    }

    pub fn boolean(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, FieldType::Boolean)
    }

    pub fn date(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, FieldType::Date)
    }

    pub fn object(namespace: &str, name: &str, properties: Vec<FieldSchema>) -> Self {
        let properties = properties
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        Self::new(namespace, name, FieldType::Object { properties })
    }

    pub fn array(namespace: &str, name: &str, items: FieldSchema) -> Self {
        Self::new(
            namespace,
            name,
            FieldType::Array {
                items: Box::new(items),
            },
        )
    }

    /// Marks the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.field_type.type_name()
    }

    pub fn kind(&self) -> FieldKind {
        self.field_type.kind()
    }
}

/// All field definitions for one vendor namespace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceSchema {
    namespace: String,
    description: String,
    fields: IndexMap<String, FieldSchema>,
    required: BTreeSet<String>,
}

impl NamespaceSchema {
    /// Builds a namespace schema.
    ///
    /// The required set is the union of each field's `required` flag and
    /// `extra_required`. Every required name must be a defined field.
    pub fn new(
        namespace: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<FieldSchema>,
        extra_required: &[String],
    ) -> SchemaResult<Self> {
        let namespace = namespace.into();
        let mut by_name: IndexMap<String, FieldSchema> = IndexMap::with_capacity(fields.len());

        for field in fields {
            if field.namespace != namespace {
                return Err(SchemaError::malformed_field(
                    &namespace,
                    &field.name,
                    format!("field declares namespace '{}'", field.namespace),
                ));
            }
            if by_name.contains_key(&field.name) {
                return Err(SchemaError::malformed_field(
                    &namespace,
                    &field.name,
                    "field is defined more than once",
                ));
            }
            by_name.insert(field.name.clone(), field);
        }

        let mut required: BTreeSet<String> = by_name
            .values()
            .filter(|f| f.required)
            .map(|f| f.name.clone())
            .collect();

        for name in extra_required {
            if !by_name.contains_key(name) {
                return Err(SchemaError::malformed(
                    Some(&namespace),
                    format!("required list references undefined field '{}'", name),
                ));
            }
            required.insert(name.clone());
        }

        Ok(Self {
            namespace,
            description: description.into(),
            fields: by_name,
            required,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.values()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn required_fields(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }
}
