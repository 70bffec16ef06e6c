//! File-level entry points: suffix dispatch and scoped open/close.
//!
//! The container format is picked from the path suffix: `.json` for the
//! text tree format, `.h5` / `.hdf5` for the hierarchical binary
//! format. File handles are scoped to each call and released on every
//! exit path, including errors.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{ScribeError, ScribeResult};
use crate::schema::Schema;
use crate::tome::Tome;
use crate::{hier, json};

/// Recognized on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON text tree (`.json`).
    Json,
    /// Hierarchical binary container (`.h5`, `.hdf5`).
    Hier,
}

impl Format {
    /// Infer the format from a path suffix.
    pub fn from_path(path: &Path) -> ScribeResult<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("h5") | Some("hdf5") => Ok(Format::Hier),
            _ => Err(ScribeError::read(format!(
                "cannot infer a data format from '{}' (expected .json, .h5 or .hdf5)",
                path.display()
            ))),
        }
    }
}

/// Read a Tome from a data file under a schema.
pub fn read_file(path: impl AsRef<Path>, schema: &Schema) -> ScribeResult<Tome> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Json => {
            let text = read_text(path)?;
            json::read_str(&text, schema)
        }
        Format::Hier => {
            let node = read_container(path)?;
            let mut tome = Tome::default();
            hier::read(Some(&mut tome), &node, schema)?;
            Ok(tome)
        }
    }
}

/// Validate a data file against a schema without building a Tome.
pub fn validate_file(path: impl AsRef<Path>, schema: &Schema) -> ScribeResult<()> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Json => {
            let text = read_text(path)?;
            json::validate_str(&text, schema)
        }
        Format::Hier => {
            let node = read_container(path)?;
            hier::validate(&node, schema)
        }
    }
}

/// Write a Tome to a data file under a schema.
pub fn write_file(path: impl AsRef<Path>, tome: &Tome, schema: &Schema) -> ScribeResult<()> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Json => {
            let text = json::write_str(tome, schema)?;
            let mut out = create(path)?;
            out.write_all(text.as_bytes())
                .and_then(|_| out.write_all(b"\n"))
                .and_then(|_| out.flush())
                .map_err(|e| write_failed(path, e))
        }
        Format::Hier => {
            let node = hier::write(tome, schema)?;
            let mut out = create(path)?;
            hier::codec::encode(&node, &mut out)?;
            out.flush().map_err(|e| write_failed(path, e))
        }
    }
}

fn read_text(path: &Path) -> ScribeResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| ScribeError::read(format!("cannot open '{}': {}", path.display(), e)))
}

fn read_container(path: &Path) -> ScribeResult<hier::HierNode> {
    let file = File::open(path)
        .map_err(|e| ScribeError::read(format!("cannot open '{}': {}", path.display(), e)))?;
    hier::codec::decode(&mut BufReader::new(file))
}

fn create(path: &Path) -> ScribeResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| write_failed(path, e))
}

fn write_failed(path: &Path, e: std::io::Error) -> ScribeError {
    ScribeError::write(format!("cannot write '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NumType;
    use crate::tome::NdArray;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_format_inference() {
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.h5")).unwrap(), Format::Hier);
        assert_eq!(Format::from_path(Path::new("a.HDF5")).unwrap(), Format::Hier);
        assert!(matches!(
            Format::from_path(Path::new("a.xml")),
            Err(ScribeError::Read(_))
        ));
        assert!(Format::from_path(Path::new("noext")).is_err());
    }

    fn sample_schema() -> Schema {
        Schema::from_value(&json!({
            "type": "record",
            "items": [
                {"key": "label", "type": "string"},
                {"key": "xs", "type": "array", "shape": [-1],
                 "elements": {"type": "int32"}}
            ]
        }))
        .unwrap()
    }

    fn sample_tome() -> Tome {
        let mut tome = Tome::record();
        tome.insert("label", Tome::string("demo")).unwrap();
        tome.insert("xs", Tome::Int32Array(NdArray::from_vec(vec![1, 2, 3])))
            .unwrap();
        tome
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let schema = sample_schema();
        let tome = sample_tome();

        write_file(&path, &tome, &schema).unwrap();
        validate_file(&path, &schema).unwrap();
        assert_eq!(read_file(&path, &schema).unwrap(), tome);
    }

    #[test]
    fn test_container_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.h5");
        let schema = sample_schema();
        let tome = sample_tome();

        write_file(&path, &tome, &schema).unwrap();
        validate_file(&path, &schema).unwrap();
        assert_eq!(read_file(&path, &schema).unwrap(), tome);
    }

    #[test]
    fn test_cross_format_convert() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("data.json");
        let h5_path = dir.path().join("data.h5");
        let schema = sample_schema();
        let tome = sample_tome();

        write_file(&json_path, &tome, &schema).unwrap();
        let loaded = read_file(&json_path, &schema).unwrap();
        write_file(&h5_path, &loaded, &schema).unwrap();
        assert_eq!(read_file(&h5_path, &schema).unwrap(), tome);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = read_file("no/such/file.json", &Schema::number(NumType::Int8)).unwrap_err();
        assert!(matches!(err, ScribeError::Read(_)));
    }

    #[test]
    fn test_validation_error_reported_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"label": 5, "xs": []}"#).unwrap();
        let err = validate_file(&path, &sample_schema()).unwrap_err();
        assert!(matches!(err, ScribeError::Validation(_)));
        assert!(err.to_string().contains("/label"));
    }
}
