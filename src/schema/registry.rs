//! In-memory registry of compiled namespace schemas
//!
//! The whole namespace map sits behind one `ArcSwap`. Readers take a
//! snapshot and never block; every load or unload publishes a new map with a
//! single pointer swap, so a namespace is either fully old or fully new.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;
use serde_json::Value;

use super::definition::{compile_document, compile_namespace, CompiledDocument, RawDocument};
use super::errors::{SchemaError, SchemaResult};
use super::loader::{definition_files, read_document, DocumentFormat, LoadReport};
use super::types::NamespaceSchema;
use crate::observability::{log_event_with_fields, Event, Logger};

/// Namespace id -> compiled schema
pub type SchemaMap = HashMap<String, Arc<NamespaceSchema>>;

pub struct SchemaRegistry {
    schemas: ArcSwap<SchemaMap>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            schemas: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Parses and registers a definition for `namespace`, replacing any
    /// previous version atomically.
    ///
    /// `definition` is the already-deserialized document body (grouped form;
    /// a `namespace` key, if present, must equal `namespace`).
    pub fn load_schema(&self, namespace: &str, definition: &Value) -> SchemaResult<Arc<NamespaceSchema>> {
        let raw = RawDocument::deserialize(definition)
            .map_err(|e| SchemaError::malformed(Some(namespace), e.to_string()))?;
        match compile_namespace(namespace, raw) {
            Ok(schema) => Ok(self.register(schema)),
            Err(e) => {
                Logger::warn(
                    Event::SchemaRejected.as_str(),
                    &[("namespace", namespace), ("reason", e.message())],
                );
                Err(e)
            }
        }
    }

    /// Registers an already-built schema, replacing any previous version.
    pub fn register(&self, schema: NamespaceSchema) -> Arc<NamespaceSchema> {
        let schema = Arc::new(schema);
        let published = Arc::clone(&schema);
        self.schemas.rcu(move |current| {
            let mut next = SchemaMap::clone(current);
            next.insert(published.namespace().to_string(), Arc::clone(&published));
            next
        });
        let field_count = schema.field_count().to_string();
        log_event_with_fields(
            Event::SchemaLoaded,
            &[("namespace", schema.namespace()), ("fields", field_count.as_str())],
        );
        schema
    }

    /// Loads every namespace defined by one document body.
    ///
    /// Fails only if the body cannot be parsed at all; per-namespace problems
    /// are listed in the report and do not stop the other namespaces.
    pub fn load_document(&self, source: &str, text: &str, format: DocumentFormat) -> SchemaResult<LoadReport> {
        let raw: RawDocument = format
            .parse(text)
            .map_err(|e| SchemaError::unreadable(source, e))?;
        Ok(self.publish(compile_document(raw), &mut HashMap::new(), source))
    }

    /// Loads every definition file in `dir`.
    ///
    /// Unreadable files and malformed namespaces are reported, not fatal. A
    /// namespace defined by two files is rejected in the later file.
    /// Namespaces not mentioned in the directory stay registered.
    pub fn load_dir(&self, dir: &Path) -> SchemaResult<LoadReport> {
        let mut report = LoadReport::default();
        let mut seen: HashMap<String, String> = HashMap::new();

        for path in definition_files(dir)? {
            let source = path.display().to_string();
            match read_document::<RawDocument>(&path) {
                Ok(raw) => {
                    let part = self.publish(compile_document(raw), &mut seen, &source);
                    report.absorb(part);
                }
                Err(e) => {
                    Logger::warn(
                        Event::SchemaRejected.as_str(),
                        &[("source", source.as_str()), ("reason", e.message())],
                    );
                    report.rejected.push(e);
                }
            }
        }

        let dir_name = dir.display().to_string();
        let loaded = report.loaded.len().to_string();
        let rejected = report.rejected.len().to_string();
        log_event_with_fields(
            Event::SchemasLoaded,
            &[
                ("dir", dir_name.as_str()),
                ("loaded", loaded.as_str()),
                ("rejected", rejected.as_str()),
            ],
        );
        Ok(report)
    }

    /// Publishes all compiled namespaces of a document in one swap.
    fn publish(
        &self,
        compiled: CompiledDocument,
        seen: &mut HashMap<String, String>,
        source: &str,
    ) -> LoadReport {
        let mut report = LoadReport {
            loaded: Vec::new(),
            rejected: compiled.rejected,
        };

        let mut accepted = Vec::new();
        for schema in compiled.schemas {
            let ns = schema.namespace().to_string();
            if let Some(first) = seen.get(&ns) {
                report.rejected.push(SchemaError::malformed(
                    Some(&ns),
                    format!("namespace already defined by '{}'", first),
                ));
                continue;
            }
            seen.insert(ns.clone(), source.to_string());
            accepted.push(Arc::new(schema));
        }

        for err in &report.rejected {
            Logger::warn(
                Event::SchemaRejected.as_str(),
                &[
                    ("source", source),
                    ("namespace", err.namespace().unwrap_or("")),
                    ("reason", err.message()),
                ],
            );
        }

        if !accepted.is_empty() {
            self.schemas.rcu(|current| {
                let mut next = SchemaMap::clone(current);
                for schema in &accepted {
                    next.insert(schema.namespace().to_string(), Arc::clone(schema));
                }
                next
            });
            for schema in &accepted {
                let field_count = schema.field_count().to_string();
                log_event_with_fields(
                    Event::SchemaLoaded,
                    &[
                        ("namespace", schema.namespace()),
                        ("fields", field_count.as_str()),
                        ("source", source),
                    ],
                );
                report.loaded.push(schema.namespace().to_string());
            }
        }

        report
    }

    /// Gets the current schema for a namespace.
    pub fn get_schema(&self, namespace: &str) -> SchemaResult<Arc<NamespaceSchema>> {
        self.schemas
            .load()
            .get(namespace)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_namespace(namespace))
    }

    /// Removes a namespace. Returns whether it was registered.
    pub fn unload(&self, namespace: &str) -> bool {
        let previous = self.schemas.rcu(|current| {
            let mut next = SchemaMap::clone(current);
            next.remove(namespace);
            next
        });
        let removed = previous.contains_key(namespace);
        if removed {
            log_event_with_fields(Event::SchemaUnloaded, &[("namespace", namespace)]);
        }
        removed
    }

    pub fn list_namespaces(&self) -> BTreeSet<String> {
        self.schemas.load().keys().cloned().collect()
    }

    /// A consistent view of every registered schema
    pub fn snapshot(&self) -> Arc<SchemaMap> {
        self.schemas.load_full()
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.schemas.load().contains_key(namespace)
    }

    pub fn len(&self) -> usize {
        self.schemas.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
