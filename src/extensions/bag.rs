//! Namespace-segregated extension values
//!
//! Values live under the namespace that wrote them and nowhere else. The
//! bag is never flattened: `epic.mrn` and `cerner.mrn` are unrelated entries.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::ExtensionValue;

/// Fields of one namespace, in first-write order
pub type NamespaceValues = IndexMap<String, ExtensionValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionsBag(BTreeMap<String, NamespaceValues>);

impl ExtensionsBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(&self, namespace: &str) -> Option<&NamespaceValues> {
        self.0.get(namespace)
    }

    pub fn get(&self, namespace: &str, field: &str) -> Option<&ExtensionValue> {
        self.0.get(namespace).and_then(|values| values.get(field))
    }

    pub fn contains(&self, namespace: &str, field: &str) -> bool {
        self.get(namespace, field).is_some()
    }

    /// Stores `value` under its own source namespace, replacing any previous
    /// value for the field. Returns the replaced value.
    pub(crate) fn put(&mut self, field: &str, value: ExtensionValue) -> Option<ExtensionValue> {
        self.0
            .entry(value.source_namespace.clone())
            .or_default()
            .insert(field.to_string(), value)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Every stored value with its namespace and field name
    pub fn values(&self) -> impl Iterator<Item = (&str, &str, &ExtensionValue)> {
        self.0.iter().flat_map(|(ns, values)| {
            values
                .iter()
                .map(move |(field, value)| (ns.as_str(), field.as_str(), value))
        })
    }

    /// Total number of stored values across namespaces
    pub fn len(&self) -> usize {
        self.0.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidationStatus;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn value(ns: &str, v: serde_json::Value) -> ExtensionValue {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        ExtensionValue::new(v, ns, at, ValidationStatus::Valid)
    }

    #[test]
    fn test_same_field_name_in_two_namespaces() {
        let mut bag = ExtensionsBag::new();
        bag.put("mrn", value("epic", json!("A1")));
        bag.put("mrn", value("cerner", json!("B2")));

        assert_eq!(bag.get("epic", "mrn").unwrap().value, json!("A1"));
        assert_eq!(bag.get("cerner", "mrn").unwrap().value, json!("B2"));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_put_replaces_and_keeps_position() {
        let mut bag = ExtensionsBag::new();
        bag.put("mrn", value("epic", json!("A1")));
        bag.put("external_id", value("epic", json!("X")));
        let old = bag.put("mrn", value("epic", json!("A2"))).unwrap();

        assert_eq!(old.value, json!("A1"));
        let names: Vec<&str> = bag.namespace("epic").unwrap().keys().map(String::as_str).collect();
        assert_eq!(names, ["mrn", "external_id"]);
    }

    #[test]
    fn test_serializes_namespace_segregated() {
        let mut bag = ExtensionsBag::new();
        bag.put("is_active", value("cerner", json!(true)));
        let json = serde_json::to_value(&bag).unwrap();
        assert_eq!(json["cerner"]["is_active"]["value"], json!(true));
        assert_eq!(json["cerner"]["is_active"]["status"], json!("valid"));

        let back: ExtensionsBag = serde_json::from_value(json).unwrap();
        assert_eq!(back, bag);
    }
}
