//! Document sources for schemas
//!
//! A schema may be handed over as an in-memory structure, a path to a JSON
//! file, or a raw JSON string. Resolution order is structure as-is, then an
//! existing path, then JSON text.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{KageError, Result};

/// Where a JSON document comes from
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// Already parsed structure, used as-is
    Value(Value),
    /// Filesystem path (falls back to JSON text if it does not exist)
    Path(PathBuf),
    /// Path or JSON text, decided at load time
    Text(String),
}

impl SchemaSource {
    /// Resolve the source into a JSON document
    pub fn load(self) -> Result<Value> {
        match self {
            SchemaSource::Value(value) => Ok(value),
            SchemaSource::Path(path) => {
                if path.exists() {
                    read_json_file(&path)
                } else {
                    parse_text(&path.to_string_lossy())
                }
            }
            SchemaSource::Text(text) => {
                let path = Path::new(&text);
                if path.exists() {
                    read_json_file(path)
                } else {
                    parse_text(&text)
                }
            }
        }
    }
}

/// Read and parse a JSON file
pub fn read_json_file(path: &Path) -> Result<Value> {
    debug!(path = %path.display(), "Loading JSON file");
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn parse_text(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|_| KageError::InvalidSource {
        source_text: text.to_string(),
    })
}

impl From<Value> for SchemaSource {
    fn from(value: Value) -> Self {
        SchemaSource::Value(value)
    }
}

impl From<&str> for SchemaSource {
    fn from(text: &str) -> Self {
        SchemaSource::Text(text.to_string())
    }
}

impl From<String> for SchemaSource {
    fn from(text: String) -> Self {
        SchemaSource::Text(text)
    }
}

impl From<&Path> for SchemaSource {
    fn from(path: &Path) -> Self {
        SchemaSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for SchemaSource {
    fn from(path: PathBuf) -> Self {
        SchemaSource::Path(path)
    }
}
