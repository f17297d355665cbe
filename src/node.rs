//! Kage node manifest
//!
//! A project directory is a Kage node when it contains a `*.node.json`
//! manifest. The manifest is validated with the engine's own schema
//! validator against the built-in node schema, then deserialized.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::engine::Kage;
use crate::error::{KageError, Result};
use crate::schema::Schema;
use crate::validator;

/// Manifest file suffix
pub const MANIFEST_SUFFIX: &str = ".node.json";

/// Language a node must declare to be runnable by this crate
pub const NODE_LANGUAGE: &str = "rust";

/// Built-in schema document for node manifests
static NODE_SCHEMA_DOC: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["name", "version", "type", "model"],
        "properties": {
            "name": "string",
            "version": "string",
            "type": "string",
            "model": {
                "type": "object",
                "required": ["execution_model", "source", "entry_file"],
                "properties": {
                    "execution_model": {
                        "type": "object",
                        "required": ["language", "input_schema", "output_schema"],
                        "properties": {
                            "language": "string",
                            "input_schema": "object",
                            "output_schema": "object",
                            "artifacts": {"type": "array", "items": "string"}
                        }
                    },
                    "source": "string",
                    "working_directory": "string",
                    "entry_file": "string",
                    "output_directory": "string"
                }
            },
            "metadata": {
                "type": "object",
                "properties": {
                    "description": "string",
                    "authors": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {"name": "string", "email": "string", "url": "string"}
                        }
                    },
                    "manual": "string",
                    "repository": "string"
                }
            }
        }
    })
});

/// Node schema, normalized once
static NODE_SCHEMA: Lazy<Result<Schema, String>> =
    Lazy::new(|| Schema::from_value(&NODE_SCHEMA_DOC).map_err(|e| e.to_string()));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeManifest {
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub model: NodeModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeModel {
    pub execution_model: ExecutionModel,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    pub entry_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionModel {
    pub language: String,
    pub input_schema: Value,
    pub output_schema: Value,
    #[serde(default)]
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub manual: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Summary printed by `--info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub valid: bool,
    pub input_schema: Value,
    pub output_schema: Value,
}

/// A loaded and structurally validated node project
#[derive(Debug, Clone)]
pub struct KageNode {
    project_dir: PathBuf,
    manifest_path: PathBuf,
    manifest: NodeManifest,
}

impl KageNode {
    /// Load the first `*.node.json` manifest found in `project_dir`
    pub fn load(project_dir: impl AsRef<Path>) -> Result<Self> {
        let project_dir = project_dir.as_ref().to_path_buf();
        let manifest_path = find_manifest(&project_dir)?;
        debug!(manifest = %manifest_path.display(), "Loading node manifest");

        let content = fs::read_to_string(&manifest_path).map_err(|e| KageError::NodeManifest {
            reason: format!("failed to read {}: {e}", manifest_path.display()),
        })?;
        let raw: Value = serde_json::from_str(&content).map_err(|e| KageError::NodeManifest {
            reason: format!("Invalid JSON in .node.json: {e}"),
        })?;

        let manifest = Self::parse_manifest(raw)?;
        Ok(Self {
            project_dir,
            manifest_path,
            manifest,
        })
    }

    /// Validate a raw manifest against the node schema and deserialize it
    pub fn parse_manifest(raw: Value) -> Result<NodeManifest> {
        let schema = NODE_SCHEMA
            .as_ref()
            .map_err(|reason| KageError::NodeManifest {
                reason: reason.clone(),
            })?;
        validator::validate(&raw, schema).map_err(|e| KageError::NodeManifest {
            reason: format!("Invalid .node.json structure: {e}"),
        })?;

        serde_json::from_value(raw).map_err(|e| KageError::NodeManifest {
            reason: format!("Invalid .node.json structure: {e}"),
        })
    }

    /// True when the entry file exists, the type is `node` and the language is supported
    pub fn is_valid(&self) -> bool {
        let entry_file = self.project_dir.join(&self.manifest.model.entry_file);
        entry_file.exists()
            && self.manifest.node_type == "node"
            && self.manifest.model.execution_model.language == NODE_LANGUAGE
    }

    pub fn manifest(&self) -> &NodeManifest {
        &self.manifest
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn description(&self) -> &str {
        self.manifest
            .metadata
            .as_ref()
            .and_then(|m| m.description.as_deref())
            .unwrap_or("")
    }

    pub fn input_schema(&self) -> &Value {
        &self.manifest.model.execution_model.input_schema
    }

    pub fn output_schema(&self) -> &Value {
        &self.manifest.model.execution_model.output_schema
    }

    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            name: self.manifest.name.clone(),
            version: self.manifest.version.clone(),
            description: self.description().to_string(),
            valid: self.is_valid(),
            input_schema: self.input_schema().clone(),
            output_schema: self.output_schema().clone(),
        }
    }

    /// Build an engine from the manifest's schemas
    pub fn initialize(&self) -> Result<Kage> {
        Kage::with_schemas(self.input_schema().clone(), self.output_schema().clone())
    }
}

fn find_manifest(project_dir: &Path) -> Result<PathBuf> {
    let not_found = || KageError::NodeManifest {
        reason: format!(".node.json not found in {}", project_dir.display()),
    };

    let pattern = format!(
        "{}/*{MANIFEST_SUFFIX}",
        glob::Pattern::escape(&project_dir.to_string_lossy())
    );
    let mut matches: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| KageError::NodeManifest {
            reason: format!("invalid project directory pattern: {e}"),
        })?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    matches.sort();

    matches.into_iter().next().ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Value {
        json!({
            "name": "doubler",
            "version": "0.1.0",
            "type": "node",
            "model": {
                "execution_model": {
                    "language": "rust",
                    "input_schema": {"n": "integer"},
                    "output_schema": {"result": {"type": "object", "properties": {"value": "integer"}}}
                },
                "source": "src",
                "entry_file": "src/main.rs"
            },
            "metadata": {"description": "Doubles numbers", "authors": [{"name": "kage"}]}
        })
    }

    #[test]
    fn node_schema_is_normalized_once() {
        let first = NODE_SCHEMA.as_ref().unwrap();
        let second = NODE_SCHEMA.as_ref().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.root().required, ["name", "version", "type", "model"]);
        assert!(first.root().field("model").unwrap().field("execution_model").is_some());
    }

    #[test]
    fn parse_valid_manifest() {
        let parsed = KageNode::parse_manifest(manifest()).unwrap();
        assert_eq!(parsed.name, "doubler");
        assert_eq!(parsed.model.execution_model.language, "rust");
        assert!(parsed.model.execution_model.artifacts.is_empty());
        assert_eq!(
            parsed.metadata.unwrap().authors[0].name.as_deref(),
            Some("kage")
        );
    }

    #[test]
    fn missing_model_fields_are_rejected() {
        let mut raw = manifest();
        raw["model"]
            .as_object_mut()
            .unwrap()
            .remove("entry_file");

        let err = KageNode::parse_manifest(raw).unwrap_err();
        assert!(matches!(err, KageError::NodeManifest { .. }));
        assert!(err.to_string().contains("model.entry_file"));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let mut raw = manifest();
        raw["version"] = json!(1);
        assert!(KageNode::parse_manifest(raw).is_err());
    }
}
