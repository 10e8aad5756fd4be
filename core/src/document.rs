//! Reading and writing spec and config documents.
//!
//! Documents are JSON or YAML files, selected by extension. Both formats are
//! read into the same [`serde_json::Value`] model; output defaults to
//! pretty-printed JSON with four-space indentation.
//!
//! # Example
//!
//! ```no_run
//! use paramspec_core::{DocumentFormat, load_document, save_document_as};
//!
//! let doc = load_document("config.yaml").unwrap();
//! save_document_as("config.json", &doc, DocumentFormat::Json).unwrap();
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Serialization format of a document file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Detects the format from the file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for anything other than
    /// `.json`, `.yaml` or `.yml`.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramspec_core::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_path("a/b.YML").unwrap(), DocumentFormat::Yaml);
    /// assert_eq!(DocumentFormat::from_path("spec.json").unwrap(), DocumentFormat::Json);
    /// assert!(DocumentFormat::from_path("spec.toml").is_err());
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Loads a nested document, detecting the format from the extension.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedFormat`],
/// [`IoError`](ConfigError::IoError), [`JsonError`](ConfigError::JsonError)
/// or [`YamlError`](ConfigError::YamlError).
pub fn load_document(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)?;
    let reader = BufReader::new(File::open(path)?);
    let document = match format {
        DocumentFormat::Json => serde_json::from_reader(reader)?,
        DocumentFormat::Yaml => serde_yaml::from_reader(reader)?,
    };
    debug!(path = %path.display(), ?format, "loaded document");
    Ok(document)
}

/// Writes a document as pretty-printed JSON, whatever the extension.
pub fn save_document(path: impl AsRef<Path>, document: &Value) -> Result<()> {
    save_document_as(path, document, DocumentFormat::Json)
}

/// Writes a document in the given format.
pub fn save_document_as(
    path: impl AsRef<Path>,
    document: &Value,
    format: DocumentFormat,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        DocumentFormat::Json => {
            let mut serializer =
                serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
            document.serialize(&mut serializer)?;
            writer.write_all(b"\n")?;
        }
        DocumentFormat::Yaml => serde_yaml::to_writer(&mut writer, document)?,
    }
    writer.flush()?;
    debug!(path = %path.display(), ?format, "saved document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_json_and_yaml_load_to_same_document() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("config.json");
        let yaml_path = dir.path().join("config.yaml");
        std::fs::write(&json_path, r#"{"a": 1, "nested": {"b": [1.5, "x"], "c": null}}"#).unwrap();
        std::fs::write(&yaml_path, "a: 1\nnested:\n  b: [1.5, x]\n  c: null\n").unwrap();
        assert_eq!(
            load_document(&json_path).unwrap(),
            load_document(&yaml_path).unwrap()
        );
    }

    #[test]
    fn test_save_writes_four_space_pretty_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        save_document(&path, &json!({"a": {"b": 1}})).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n    \"a\": {\n        \"b\": 1\n    }\n}\n");
    }

    #[test]
    fn test_yaml_output_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.yml");
        let doc = json!({"z": [1, 2], "a": "text", "m": {"k": true}});
        save_document_as(&path, &doc, DocumentFormat::Yaml).unwrap();
        let reloaded = load_document(&path).unwrap();
        assert_eq!(reloaded, doc);
        let keys: Vec<&String> = reloaded.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_document("values.ini").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_document(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
