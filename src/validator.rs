//! Schema validator
//!
//! Walks a document against a normalized [`Schema`]. Required fields are
//! checked before field types at each object level. Fields are then checked
//! in document order and the first problem found is returned. Keys the
//! schema does not mention are accepted.

use serde_json::Value;

use crate::error::{KageError, Result};
use crate::schema::{display_path, join_path, type_name, Schema, SchemaNode, TypeTag};

/// Validate a whole document against a schema
pub fn validate(document: &Value, schema: &Schema) -> Result<()> {
    validate_object(document, schema.root(), "")
}

/// Validate an object value against an object node at `path`
pub fn validate_object(data: &Value, node: &SchemaNode, path: &str) -> Result<()> {
    let Some(map) = data.as_object() else {
        return Err(KageError::TypeMismatch {
            path: display_path(path).to_string(),
            expected: TypeTag::Object.to_string(),
            actual: type_name(data).to_string(),
        });
    };

    for field in &node.required {
        if !map.contains_key(field) {
            return Err(KageError::MissingField {
                path: join_path(path, field),
            });
        }
    }

    for (key, value) in map {
        if let Some(field_node) = node.field(key) {
            validate_field(value, field_node, &join_path(path, key))?;
        }
    }

    Ok(())
}

fn validate_field(value: &Value, node: &SchemaNode, path: &str) -> Result<()> {
    if let Some(tag) = node.type_tag {
        if !tag.matches(value) {
            return Err(KageError::TypeMismatch {
                path: path.to_string(),
                expected: tag.to_string(),
                actual: type_name(value).to_string(),
            });
        }
    }

    descend(value, node, path)
}

/// Validate every element of an array against the item node
pub fn validate_array(items: &[Value], item_node: &SchemaNode, path: &str) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{i}]");

        if let Some(tag) = item_node.type_tag {
            if !tag.matches(item) {
                return Err(KageError::ItemTypeMismatch {
                    path: item_path,
                    expected: tag.to_string(),
                    actual: type_name(item).to_string(),
                });
            }
        }

        descend(item, item_node, &item_path)?;
    }

    Ok(())
}

/// Recurse into nested objects and arrays once the type itself matched
fn descend(value: &Value, node: &SchemaNode, path: &str) -> Result<()> {
    match (node.type_tag, value) {
        (Some(TypeTag::Object), Value::Object(_)) => validate_object(value, node, path),
        (Some(TypeTag::Array), Value::Array(items)) => match node.items.as_deref() {
            Some(item_node) => validate_array(items, item_node, path),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}
