//! Kage - schema-driven function orchestration
//!
//! Declare input/output schemas, bind operations to document keys, and let
//! the engine validate the input, resolve dependencies and assemble the
//! output document.

pub mod binding;
pub mod cli;
pub mod dotpath;
pub mod engine;
pub mod error;
pub mod flow_graph;
pub mod node;
pub mod operation;
pub mod result_store;
pub mod schema;
pub mod skeleton;
pub mod source;
pub mod validator;

pub use binding::{DepVec, FunctionBinding};
pub use engine::Kage;
pub use error::{ErrorKind, FixSuggestion, KageError, Result};
pub use flow_graph::FlowGraph;
pub use node::{KageNode, NodeInfo, NodeManifest};
pub use operation::{operation, Args, FnOperation, Operation};
pub use result_store::{BindingResult, ResultStore};
pub use schema::{Schema, SchemaForm, SchemaNode, TypeTag};
pub use source::SchemaSource;
