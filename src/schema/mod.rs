//! Vendor field schemas
//!
//! Each vendor namespace declares the fields it may write into a profile's
//! extensions bag. Definitions are compiled once into typed values and
//! published through the registry; the validator checks raw payloads against
//! the published snapshot.
//!
//! # Rules
//!
//! - Namespaces are case-sensitive and unique
//! - A malformed definition is rejected alone, the rest still load
//! - Validation reports every failure, one per field
//! - Fields without a definition are accepted and tagged, never promoted

mod definition;
mod errors;
mod loader;
mod registry;
mod types;
mod validator;

pub use definition::{
    compile_document, compile_namespace, CompiledDocument, RawDocument, RawField, RawFields,
    RawValidation,
};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, ValidationError, ValidationErrors};
pub use loader::{definition_files, read_document, DocumentFormat, LoadReport};
pub use registry::{SchemaMap, SchemaRegistry};
pub use types::{Constraints, FieldKind, FieldSchema, FieldType, NamespaceSchema, Pattern};
pub use validator::{
    validate_against, SchemaValidator, ValidatedField, ValidatedPayload, ValidationStatus,
};
