//! Error types with fix suggestions
//!
//! Every failure surfaced by the engine is one `KageError`. Codes are grouped
//! by range so the four error kinds stay distinguishable at the boundary:
//!
//! - `KAGE-00x` usage / boundary errors
//! - `KAGE-01x` schema errors (configuration bugs)
//! - `KAGE-02x` validation errors (bad data)
//! - `KAGE-03x` execution errors
//! - `KAGE-04x` node manifest errors

use serde_json::{json, Value};
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T, E = KageError> = std::result::Result<T, E>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// The four distinguishable error kinds of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The schema document itself is invalid
    Schema,
    /// A data document does not conform to its schema
    Validation,
    /// Dependency resolution or a bound operation failed
    Execution,
    /// Catch-all for boundary and usage errors
    Usage,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Schema => write!(f, "SchemaError"),
            ErrorKind::Validation => write!(f, "ValidationError"),
            ErrorKind::Execution => write!(f, "ExecutionError"),
            ErrorKind::Usage => write!(f, "KageError"),
        }
    }
}

/// A binding that could not be scheduled, with the dependencies it still waits on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuckBinding {
    pub name: String,
    pub missing: Vec<String>,
}

impl std::fmt::Display for StuckBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> [{}]", self.name, self.missing.join(", "))
    }
}

fn format_stuck(stuck: &[StuckBinding]) -> String {
    stuck
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum KageError {
    // ─────────────────────────────────────────────────────────────
    // Usage / boundary errors (KAGE-001 to KAGE-006)
    // ─────────────────────────────────────────────────────────────
    #[error("KAGE-001: Invalid JSON data or file path: {source_text}")]
    InvalidSource { source_text: String },

    #[error("KAGE-002: Input key '{key}' not found in input data (binding '{binding}')")]
    InputKeyNotFound { key: String, binding: String },

    #[error("KAGE-003: Parameter '{param}' not found in operation '{binding}'")]
    UnknownParameter { param: String, binding: String },

    #[error("KAGE-004: Path '{path}' not found")]
    PathNotFound { path: String },

    #[error("KAGE-005: IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("KAGE-006: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Schema errors (KAGE-010 to KAGE-012)
    // ─────────────────────────────────────────────────────────────
    #[error("KAGE-010: Unsupported type '{type_tag}' at {path}")]
    UnsupportedType { type_tag: String, path: String },

    #[error("KAGE-011: Schema must be an object at {path}")]
    SchemaNotObject { path: String },

    #[error("KAGE-012: Invalid schema at {path}: {reason}")]
    InvalidSchema { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Validation errors (KAGE-020 to KAGE-022)
    // ─────────────────────────────────────────────────────────────
    #[error("KAGE-020: Required field '{path}' missing")]
    MissingField { path: String },

    #[error("KAGE-021: Type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("KAGE-022: Array item type mismatch at {path}: expected {expected}, got {actual}")]
    ItemTypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Execution errors (KAGE-030 to KAGE-033)
    // ─────────────────────────────────────────────────────────────
    #[error("KAGE-030: No functions bound for execution")]
    NoBindings,

    #[error("KAGE-031: Circular or missing dependencies: {}", format_stuck(.stuck))]
    UnresolvedDependencies { stuck: Vec<StuckBinding> },

    #[error("KAGE-032: Error executing function '{binding}': {source}")]
    OperationFailed {
        binding: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("KAGE-033: Argument '{param}' of '{binding}' could not be resolved from '{key}'")]
    ArgumentUnavailable {
        binding: String,
        param: String,
        key: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Node manifest errors (KAGE-040)
    // ─────────────────────────────────────────────────────────────
    #[error("KAGE-040: Node validation error: {reason}")]
    NodeManifest { reason: String },
}

impl KageError {
    /// Which of the four error kinds this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            KageError::UnsupportedType { .. }
            | KageError::SchemaNotObject { .. }
            | KageError::InvalidSchema { .. } => ErrorKind::Schema,

            KageError::MissingField { .. }
            | KageError::TypeMismatch { .. }
            | KageError::ItemTypeMismatch { .. } => ErrorKind::Validation,

            KageError::NoBindings
            | KageError::UnresolvedDependencies { .. }
            | KageError::OperationFailed { .. }
            | KageError::ArgumentUnavailable { .. } => ErrorKind::Execution,

            KageError::InvalidSource { .. }
            | KageError::InputKeyNotFound { .. }
            | KageError::UnknownParameter { .. }
            | KageError::PathNotFound { .. }
            | KageError::Io(_)
            | KageError::Json(_)
            | KageError::NodeManifest { .. } => ErrorKind::Usage,
        }
    }

    /// Field path carried by validation errors
    pub fn path(&self) -> Option<&str> {
        match self {
            KageError::MissingField { path }
            | KageError::TypeMismatch { path, .. }
            | KageError::ItemTypeMismatch { path, .. }
            | KageError::PathNotFound { path }
            | KageError::UnsupportedType { path, .. }
            | KageError::SchemaNotObject { path }
            | KageError::InvalidSchema { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Error document written at the boundary: `{"error": <message>}`
    pub fn to_payload(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl FixSuggestion for KageError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            KageError::InvalidSource { .. } => {
                Some("Pass a JSON object, an existing file path, or a valid JSON string")
            }
            KageError::InputKeyNotFound { .. } => {
                Some("Add the key to the input document or map the parameter to a bound function")
            }
            KageError::UnknownParameter { .. } => {
                Some("Map only parameters declared by the operation")
            }
            KageError::PathNotFound { .. } => Some("Check the dot path exists (a.b.c)"),
            KageError::Io(_) => Some("Check file path and permissions"),
            KageError::Json(_) => Some("Check JSON syntax"),
            KageError::UnsupportedType { .. } => Some(
                "Use one of: string, integer, float, boolean, array, object, null",
            ),
            KageError::SchemaNotObject { .. } => {
                Some("Schemas are a type tag string or an object with type/properties")
            }
            KageError::InvalidSchema { .. } => {
                Some("Check required is a list of names and properties is an object")
            }
            KageError::MissingField { .. } => Some("Add the required field to the document"),
            KageError::TypeMismatch { .. } | KageError::ItemTypeMismatch { .. } => {
                Some("Fix the value to match the declared type")
            }
            KageError::NoBindings => Some("Bind at least one function before executing"),
            KageError::UnresolvedDependencies { .. } => {
                Some("Bind every dependency and remove circular dependencies")
            }
            KageError::OperationFailed { .. } => None,
            KageError::ArgumentUnavailable { .. } => {
                Some("Declare the producing function as a dependency")
            }
            KageError::NodeManifest { .. } => {
                Some("Check the *.node.json manifest in the project directory")
            }
        }
    }
}
