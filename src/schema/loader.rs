//! Reading definition documents from disk
//!
//! Documents are YAML (`.yaml`, `.yml`) or JSON (`.json`). Files are read in
//! name order so repeated loads of the same directory are deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{SchemaError, SchemaResult};

/// Serialization format of a definition or table document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Picks the format from a file extension, if it is one we read.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(DocumentFormat::Yaml),
            Some("json") => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    /// Deserializes a document body.
    pub fn parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, String> {
        match self {
            DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            DocumentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// Reads and parses one document file.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> SchemaResult<T> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        SchemaError::unreadable(path.display().to_string(), "unsupported file extension")
    })?;
    let content = fs::read_to_string(path).map_err(|e| {
        SchemaError::unreadable(path.display().to_string(), format!("Failed to read file: {}", e))
    })?;
    format
        .parse(&content)
        .map_err(|e| SchemaError::unreadable(path.display().to_string(), e))
}

/// Lists definition files in `dir`, sorted by file name.
pub fn definition_files(dir: &Path) -> SchemaResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        SchemaError::unreadable(
            dir.display().to_string(),
            format!("Failed to read schema directory: {}", e),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            SchemaError::unreadable(
                dir.display().to_string(),
                format!("Failed to read directory entry: {}", e),
            )
        })?;
        let path = entry.path();
        if path.is_file() && DocumentFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Result of loading one or more documents into the registry.
///
/// A rejected namespace leaves its previously loaded version (if any) in
/// place; namespaces that compiled are swapped in regardless.
#[derive(Debug, Default, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    #[serde(serialize_with = "serialize_rejections")]
    pub rejected: Vec<SchemaError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub(crate) fn absorb(&mut self, other: LoadReport) {
        self.loaded.extend(other.loaded);
        self.rejected.extend(other.rejected);
    }
}

fn serialize_rejections<S: serde::Serializer>(errors: &[SchemaError], serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;

    let mut seq = serializer.serialize_seq(Some(errors.len()))?;
    for err in errors {
        seq.serialize_element(&serde_json::json!({
            "code": err.code().code(),
            "namespace": err.namespace(),
            "field": err.field(),
            "message": err.message(),
        }))?;
    }
    seq.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("epic.yaml")), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_path(Path::new("epic.yml")), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_path(Path::new("epic.json")), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_path(Path::new("README.md")), None);
    }

    #[test]
    fn test_yaml_and_json_parse_alike() {
        let yaml: Value = DocumentFormat::Yaml.parse("namespace: epic\nfields: {}\n").unwrap();
        let json: Value = DocumentFormat::Json
            .parse(r#"{"namespace": "epic", "fields": {}}"#)
            .unwrap();
        assert_eq!(yaml, json);
    }

    #[test]
    fn test_definition_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hint.yaml"), "namespace: hint").unwrap();
        fs::write(dir.path().join("cerner.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = definition_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["cerner.json", "hint.yaml"]);
    }

    #[test]
    fn test_missing_directory_is_unreadable() {
        let err = definition_files(Path::new("/nonexistent/schemas")).unwrap_err();
        assert_eq!(err.code().code(), "EXT_SCHEMA_UNREADABLE");
    }
}
