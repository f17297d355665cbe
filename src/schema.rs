//! Canonical schema representation
//!
//! Schemas arrive in two shapes: `{"properties": {...}, "required": [...]}`
//! or a bare `{"field": "type"}` map. Both are normalized once, at load
//! time, into a tree of [`SchemaNode`]s so the validator and the document
//! initializer never look at the raw JSON again.

use serde_json::{Map, Value};

use crate::error::{KageError, Result};
use crate::source::SchemaSource;

/// Supported primitive type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Integer,
    /// Any JSON number; integers are accepted where floats are declared
    Float,
    Boolean,
    Array,
    Object,
    Null,
}

impl TypeTag {
    /// Parse a type tag, failing with a schema error for unknown tags
    pub fn parse(tag: &str, path: &str) -> Result<Self> {
        match tag {
            "string" => Ok(TypeTag::String),
            "integer" => Ok(TypeTag::Integer),
            "float" => Ok(TypeTag::Float),
            "boolean" => Ok(TypeTag::Boolean),
            "array" => Ok(TypeTag::Array),
            "object" => Ok(TypeTag::Object),
            "null" => Ok(TypeTag::Null),
            other => Err(KageError::UnsupportedType {
                type_tag: other.to_string(),
                path: display_path(path).to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::Boolean => "boolean",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Null => "null",
        }
    }

    /// Check a runtime value against this tag
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeTag::String => value.is_string(),
            TypeTag::Integer => value.is_i64() || value.is_u64(),
            TypeTag::Float => value.is_number(),
            TypeTag::Boolean => value.is_boolean(),
            TypeTag::Array => value.is_array(),
            TypeTag::Object => value.is_object(),
            TypeTag::Null => value.is_null(),
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type name of a runtime value, in type tag vocabulary
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Which raw shape a document schema was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaForm {
    /// `{"properties": {...}}`
    Properties,
    /// `{"field": "type", ...}`
    Bare,
}

/// One named field of an object node
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub node: SchemaNode,
}

/// One unit of the schema tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    /// Declared type, if any
    pub type_tag: Option<TypeTag>,
    /// Field names that must be present (object nodes)
    pub required: Vec<String>,
    /// Declared fields in schema order (object nodes)
    pub fields: Vec<Field>,
    /// Schema applied to every element (array nodes)
    pub items: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    /// A node that is only a type tag
    pub fn tag(type_tag: TypeTag) -> Self {
        Self {
            type_tag: Some(type_tag),
            ..Default::default()
        }
    }

    /// Look up a declared field
    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.node)
    }

    pub fn is_type(&self, type_tag: TypeTag) -> bool {
        self.type_tag == Some(type_tag)
    }
}

/// A normalized document schema
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: SchemaNode,
    form: SchemaForm,
}

impl Schema {
    /// Resolve a source and normalize it
    pub fn load(source: impl Into<SchemaSource>) -> Result<Self> {
        let value = source.into().load()?;
        Self::from_value(&value)
    }

    /// Normalize a raw schema document
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(KageError::SchemaNotObject {
                path: "root".to_string(),
            });
        };

        if let Some(properties) = obj.get("properties") {
            let type_tag = parse_type(obj, "")?;
            let root = SchemaNode {
                type_tag,
                required: parse_required(obj, "")?,
                fields: parse_properties(properties, "")?,
                items: None,
            };
            return Ok(Self {
                root,
                form: SchemaForm::Properties,
            });
        }

        // Bare map: every entry that looks like a schema node is a field.
        // `required` is the required list only when it holds a list.
        let required_list = obj.get("required").is_some_and(Value::is_array);
        let mut fields = Vec::with_capacity(obj.len());
        for (name, node) in obj {
            if required_list && name == "required" {
                continue;
            }
            if matches!(node, Value::String(_) | Value::Object(_)) {
                fields.push(Field {
                    name: name.clone(),
                    node: parse_node(node, name)?,
                });
            } else {
                return Err(KageError::InvalidSchema {
                    path: name.clone(),
                    reason: "expected a type tag or an object".to_string(),
                });
            }
        }

        let required = if required_list {
            parse_required(obj, "")?
        } else {
            Vec::new()
        };

        Ok(Self {
            root: SchemaNode {
                type_tag: None,
                required,
                fields,
                items: None,
            },
            form: SchemaForm::Bare,
        })
    }

    /// An empty schema that accepts any object
    pub fn empty() -> Self {
        Self {
            root: SchemaNode::default(),
            form: SchemaForm::Bare,
        }
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn form(&self) -> SchemaForm {
        self.form
    }

    /// True when the schema declares no fields and no required names
    pub fn is_empty(&self) -> bool {
        self.root.fields.is_empty() && self.root.required.is_empty()
    }

    /// Validate a document against this schema
    pub fn validate(&self, document: &Value) -> Result<()> {
        crate::validator::validate(document, self)
    }
}

/// Join a parent path and a field name (root is the empty path)
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

pub(crate) fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "root"
    } else {
        path
    }
}

fn parse_node(value: &Value, path: &str) -> Result<SchemaNode> {
    match value {
        Value::String(tag) => Ok(SchemaNode::tag(TypeTag::parse(tag, path)?)),
        Value::Object(obj) => {
            let fields = match obj.get("properties") {
                Some(properties) => parse_properties(properties, path)?,
                None => Vec::new(),
            };
            let items = match obj.get("items") {
                Some(items) => Some(Box::new(parse_node(items, &format!("{path}[]"))?)),
                None => None,
            };
            Ok(SchemaNode {
                type_tag: parse_type(obj, path)?,
                required: parse_required(obj, path)?,
                fields,
                items,
            })
        }
        _ => Err(KageError::InvalidSchema {
            path: display_path(path).to_string(),
            reason: "expected a type tag or an object".to_string(),
        }),
    }
}

fn parse_type(obj: &Map<String, Value>, path: &str) -> Result<Option<TypeTag>> {
    match obj.get("type") {
        None => Ok(None),
        Some(Value::String(tag)) => TypeTag::parse(tag, path).map(Some),
        Some(_) => Err(KageError::InvalidSchema {
            path: display_path(path).to_string(),
            reason: "type must be a string".to_string(),
        }),
    }
}

fn parse_required(obj: &Map<String, Value>, path: &str) -> Result<Vec<String>> {
    let Some(required) = obj.get("required") else {
        return Ok(Vec::new());
    };

    let invalid = || KageError::InvalidSchema {
        path: display_path(path).to_string(),
        reason: "required must be a list of field names".to_string(),
    };

    required
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|name| name.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn parse_properties(value: &Value, path: &str) -> Result<Vec<Field>> {
    let Some(properties) = value.as_object() else {
        return Err(KageError::InvalidSchema {
            path: display_path(path).to_string(),
            reason: "properties must be an object".to_string(),
        });
    };

    properties
        .iter()
        .map(|(name, node)| {
            Ok(Field {
                name: name.clone(),
                node: parse_node(node, &join_path(path, name))?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn both_forms_normalize_to_the_same_fields() {
        let wrapped = Schema::from_value(&json!({
            "properties": {"name": "string", "age": "integer"}
        }))
        .unwrap();
        let bare = Schema::from_value(&json!({"name": "string", "age": "integer"})).unwrap();

        assert_eq!(wrapped.form(), SchemaForm::Properties);
        assert_eq!(bare.form(), SchemaForm::Bare);
        assert_eq!(wrapped.root().fields, bare.root().fields);
    }

    #[test]
    fn bare_form_keeps_required_list() {
        let schema = Schema::from_value(&json!({"required": ["n"], "n": "integer"})).unwrap();
        assert_eq!(schema.root().required, vec!["n".to_string()]);
        assert_eq!(schema.root().fields.len(), 1);
    }

    #[test]
    fn bare_field_named_required() {
        let schema = Schema::from_value(&json!({"required": "string", "n": "integer"})).unwrap();
        assert!(schema.root().required.is_empty());
        assert_eq!(schema.root().field("required").unwrap().type_tag, Some(TypeTag::String));
        assert_eq!(schema.root().fields.len(), 2);

        assert!(schema.validate(&json!({"required": "yes", "n": 1})).is_ok());
        assert!(schema.validate(&json!({"required": 3})).is_err());
    }

    #[test]
    fn nested_nodes_are_parsed() {
        let schema = Schema::from_value(&json!({
            "properties": {
                "user": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {"id": "integer"}
                },
                "tags": {"type": "array", "items": "string"}
            }
        }))
        .unwrap();

        let user = schema.root().field("user").unwrap();
        assert!(user.is_type(TypeTag::Object));
        assert_eq!(user.required, vec!["id".to_string()]);
        assert_eq!(user.field("id"), Some(&SchemaNode::tag(TypeTag::Integer)));

        let tags = schema.root().field("tags").unwrap();
        assert_eq!(tags.items.as_deref(), Some(&SchemaNode::tag(TypeTag::String)));
    }

    #[test]
    fn unsupported_tag_is_a_schema_error() {
        let err = Schema::from_value(&json!({"when": "date"})).unwrap_err();
        assert!(matches!(
            err,
            KageError::UnsupportedType { ref type_tag, ref path } if type_tag == "date" && path == "when"
        ));
    }

    #[test]
    fn non_object_schema_is_rejected() {
        let err = Schema::from_value(&json!(["string"])).unwrap_err();
        assert!(matches!(err, KageError::SchemaNotObject { .. }));
    }

    #[test]
    fn required_must_be_names() {
        let err = Schema::from_value(&json!({"properties": {}, "required": [1]})).unwrap_err();
        assert!(matches!(err, KageError::InvalidSchema { .. }));
    }

    #[test]
    fn float_accepts_integers_but_integer_rejects_fractions() {
        assert!(TypeTag::Float.matches(&json!(3)));
        assert!(TypeTag::Float.matches(&json!(3.5)));
        assert!(TypeTag::Integer.matches(&json!(3)));
        assert!(!TypeTag::Integer.matches(&json!(3.5)));
        assert!(!TypeTag::Integer.matches(&json!(true)));
    }

    #[test]
    fn type_names() {
        assert_eq!(type_name(&json!("x")), "string");
        assert_eq!(type_name(&json!(1)), "integer");
        assert_eq!(type_name(&json!(1.5)), "float");
        assert_eq!(type_name(&json!(null)), "null");
        assert_eq!(type_name(&json!({})), "object");
    }

    #[test]
    fn empty_schema() {
        assert!(Schema::from_value(&json!({})).unwrap().is_empty());
        assert!(Schema::empty().is_empty());
    }
}
