//! Output document initializer
//!
//! Builds the empty output document for an output schema: every declared key
//! is present, objects expand into their own fields, arrays start empty and
//! everything else is `null` until a binding writes it.

use serde_json::{Map, Value};

use crate::schema::{Schema, SchemaNode, TypeTag};

/// Build the skeleton output document for a schema
pub fn initialize(schema: &Schema) -> Value {
    Value::Object(init_fields(schema.root()))
}

fn init_fields(node: &SchemaNode) -> Map<String, Value> {
    node.fields
        .iter()
        .map(|field| (field.name.clone(), init_node(&field.node)))
        .collect()
}

fn init_node(node: &SchemaNode) -> Value {
    match node.type_tag {
        Some(TypeTag::Object) => Value::Object(init_fields(node)),
        Some(TypeTag::Array) => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}
