//! Kage execution engine
//!
//! Holds the input/output schemas and the binding table. `execute` validates
//! the input, resolves the execution order, then runs each binding once,
//! feeding it either earlier results or input fields and writing its result
//! into the output document.
//!
//! State is scoped to one `execute` call: stored results are cleared and the
//! output document is re-seeded from the output schema at the start of each
//! call.

use std::fs;
use std::path::Path;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::binding::FunctionBinding;
use crate::dotpath;
use crate::error::{KageError, Result};
use crate::flow_graph::FlowGraph;
use crate::operation::Args;
use crate::result_store::{BindingResult, ResultStore};
use crate::schema::Schema;
use crate::skeleton;
use crate::source::SchemaSource;
use crate::validator;

/// Transient per-execution state
#[derive(Debug, Default)]
struct ExecutionState {
    input: Value,
    results: ResultStore,
    output: Value,
}

/// Schema-driven function orchestration engine
pub struct Kage {
    input_schema: Schema,
    output_schema: Option<Schema>,
    /// Bindings in registration order
    bindings: Vec<FunctionBinding>,
    /// name -> position in `bindings`
    index: FxHashMap<String, usize>,
    state: ExecutionState,
}

impl Kage {
    /// Create an engine with an input schema and no output schema
    pub fn new(input_schema: impl Into<SchemaSource>) -> Result<Self> {
        Ok(Self::from_parts(Schema::load(input_schema)?, None))
    }

    /// Create an engine with input and output schemas
    pub fn with_schemas(
        input_schema: impl Into<SchemaSource>,
        output_schema: impl Into<SchemaSource>,
    ) -> Result<Self> {
        let input = Schema::load(input_schema)?;
        let output = Schema::load(output_schema)?;
        Ok(Self::from_parts(input, Some(output)))
    }

    /// Create an engine from schema files
    pub fn from_files(input_schema: &Path, output_schema: Option<&Path>) -> Result<Self> {
        let input = Schema::load(input_schema)?;
        let output = output_schema.map(|p| Schema::load(p)).transpose()?;
        Ok(Self::from_parts(input, output))
    }

    /// Create an engine from already normalized schemas
    pub fn from_parts(input_schema: Schema, output_schema: Option<Schema>) -> Self {
        // An output schema without fields behaves like no output schema
        let output_schema = output_schema.filter(|s| !s.is_empty());
        let mut kage = Self {
            input_schema,
            output_schema,
            bindings: Vec::new(),
            index: FxHashMap::default(),
            state: ExecutionState::default(),
        };
        kage.state.output = kage.initial_output();
        kage
    }

    /// Register a binding (chainable)
    ///
    /// Fails if a mapped parameter is not declared by the operation.
    /// Re-binding an existing name replaces the earlier binding in place.
    pub fn bind(&mut self, binding: FunctionBinding) -> Result<&mut Self> {
        binding.validate_parameters()?;

        debug!(
            binding = binding.name(),
            dependencies = ?binding.get_dependencies(),
            output_key = ?binding.output_key(),
            "Binding function"
        );

        match self.index.get(binding.name()).copied() {
            Some(pos) => self.bindings[pos] = binding,
            None => {
                self.index
                    .insert(binding.name().to_string(), self.bindings.len());
                self.bindings.push(binding);
            }
        }
        Ok(self)
    }

    /// Resolve the order bindings will run in
    pub fn execution_order(&self) -> Result<Vec<String>> {
        FlowGraph::from_bindings(&self.bindings).execution_order()
    }

    /// Execute every binding in dependency order and return the output document
    #[instrument(skip_all, fields(bindings = self.bindings.len()))]
    pub fn execute(&mut self, input: Value) -> Result<Value> {
        if self.bindings.is_empty() {
            return Err(KageError::NoBindings);
        }

        validator::validate(&input, &self.input_schema)?;

        let order = self.execution_order()?;
        self.check_input_keys(&order, &input)?;
        info!(order = ?order, "Starting execution");

        self.state = ExecutionState {
            input,
            results: ResultStore::new(),
            output: self.initial_output(),
        };

        let positions: Vec<usize> = order
            .iter()
            .filter_map(|name| self.index.get(name).copied())
            .collect();
        for pos in positions {
            self.run_binding(pos)?;
        }

        info!(
            executed = self.state.results.len(),
            elapsed = ?self.state.results.total_duration(),
            "Execution completed"
        );
        Ok(self.state.output.clone())
    }

    /// Every mapped key must name a binding that runs earlier in `order`
    /// or exist in the input, so no binding starts unless all can
    fn check_input_keys(&self, order: &[String], input: &Value) -> Result<()> {
        let mut placed: FxHashSet<&str> = FxHashSet::default();

        for name in order {
            let Some(binding) = self.binding(name) else {
                continue;
            };
            for (param, key) in binding.input_mapping() {
                if placed.contains(key.as_str()) || dotpath::exists(key, input) {
                    continue;
                }
                // A binding's result read before that binding has run
                if self.index.contains_key(key) {
                    return Err(KageError::ArgumentUnavailable {
                        binding: binding.name().to_string(),
                        param: param.clone(),
                        key: key.clone(),
                    });
                }
                return Err(KageError::InputKeyNotFound {
                    key: key.clone(),
                    binding: binding.name().to_string(),
                });
            }
            placed.insert(binding.name());
        }
        Ok(())
    }

    fn run_binding(&mut self, pos: usize) -> Result<()> {
        let binding = &self.bindings[pos];
        let name = binding.name();

        let mut args = Args::new();
        for (param, key) in binding.input_mapping() {
            let value = match self.state.results.get_output(key) {
                Some(result) => {
                    if !binding.depends_on_binding(key) {
                        warn!(
                            binding = name,
                            producer = %key,
                            "Reading a result without declaring it as a dependency"
                        );
                    }
                    result.clone()
                }
                None => dotpath::lookup(key, &self.state.input)
                    .cloned()
                    .ok_or_else(|| KageError::ArgumentUnavailable {
                        binding: name.to_string(),
                        param: param.clone(),
                        key: key.clone(),
                    })?,
            };
            args.insert(param.clone(), value);
        }

        debug!(
            binding = name,
            arguments = %args.to_value(),
            dependencies = ?binding.get_dependencies(),
            "Executing"
        );

        let started = Instant::now();
        let output = binding.operation().invoke(&args).map_err(|source| {
            warn!(binding = name, error = %source, "Function failed");
            KageError::OperationFailed {
                binding: name.to_string(),
                source,
            }
        })?;
        let duration = started.elapsed();

        if let Some(output_key) = binding.output_key() {
            dotpath::set(output_key, output.clone(), &mut self.state.output);
            debug!(binding = name, output_key, "Stored in output");
        }

        debug!(binding = name, result = %output, elapsed = ?duration, "Executed");
        self.state
            .results
            .insert(name, BindingResult::new(output, duration));
        Ok(())
    }

    fn initial_output(&self) -> Value {
        match &self.output_schema {
            Some(schema) => skeleton::initialize(schema),
            None => Value::Object(Map::new()),
        }
    }

    /// Stored result of a binding from the last execution
    pub fn result(&self, name: &str) -> Option<&Value> {
        self.state.results.get_output(name)
    }

    /// All stored results of the last execution, in execution order
    pub fn results(&self) -> impl Iterator<Item = (&str, &BindingResult)> {
        self.state.results.iter()
    }

    /// Value from the last input document
    pub fn input_value(&self, key: &str) -> Option<&Value> {
        dotpath::lookup(key, &self.state.input)
    }

    /// Current output document (possibly partially filled)
    pub fn output(&self) -> &Value {
        &self.state.output
    }

    /// Output document as JSON with 2-space indentation
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.state.output)?)
    }

    /// Write the output document, creating parent directories
    pub fn save_output(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), &self.state.output)
    }

    /// Binding names in registration order
    pub fn binding_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(FunctionBinding::name)
    }

    pub fn binding(&self, name: &str) -> Option<&FunctionBinding> {
        self.index.get(name).map(|&pos| &self.bindings[pos])
    }

    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    pub fn output_schema(&self) -> Option<&Schema> {
        self.output_schema.as_ref()
    }
}

impl std::fmt::Debug for Kage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kage")
            .field("bindings", &self.bindings)
            .field("output", &self.state.output)
            .finish_non_exhaustive()
    }
}

/// Write a JSON document with 2-space indentation, creating parent directories
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::operation;
    use serde_json::json;

    fn double() -> FunctionBinding {
        FunctionBinding::new(operation("double", ["x"], |args| {
            Ok(json!(args.parse::<i64>("x")? * 2))
        }))
    }

    #[test]
    fn initial_output_is_seeded() {
        let kage = Kage::with_schemas(
            json!({}),
            json!({"properties": {"x": {"type": "object", "properties": {"y": "string"}}}}),
        )
        .unwrap();
        assert_eq!(kage.output(), &json!({"x": {"y": null}}));
    }

    #[test]
    fn empty_output_schema_means_no_skeleton() {
        let kage = Kage::with_schemas(json!({}), json!({})).unwrap();
        assert!(kage.output_schema().is_none());
        assert_eq!(kage.output(), &json!({}));
    }

    #[test]
    fn rebinding_replaces_in_place() {
        let mut kage = Kage::new(json!({})).unwrap();
        kage.bind(double().input("x", "a"))
            .unwrap()
            .bind(FunctionBinding::new(operation("other", ["v"], |_| Ok(json!(0)))))
            .unwrap()
            .bind(double().input("x", "b"))
            .unwrap();

        let names: Vec<&str> = kage.binding_names().collect();
        assert_eq!(names, ["double", "other"]);
        assert_eq!(
            kage.binding("double").unwrap().input_mapping(),
            &[("x".to_string(), "b".to_string())]
        );
    }

    #[test]
    fn registration_rejects_unknown_parameter() {
        let mut kage = Kage::new(json!({})).unwrap();
        let err = kage.bind(double().input("y", "n")).unwrap_err();
        assert!(matches!(err, KageError::UnknownParameter { .. }));
        assert_eq!(kage.binding_names().count(), 0);
    }

    #[test]
    fn state_is_fresh_for_each_execution() {
        let mut kage = Kage::new(json!({"n": "integer"})).unwrap();
        kage.bind(double().input("x", "n").output("value")).unwrap();

        assert_eq!(kage.execute(json!({"n": 1})).unwrap(), json!({"value": 2}));
        assert_eq!(kage.execute(json!({"n": 4})).unwrap(), json!({"value": 8}));
        assert_eq!(kage.result("double"), Some(&json!(8)));
        assert_eq!(kage.input_value("n"), Some(&json!(4)));
    }

    #[test]
    fn validation_failure_leaves_state_untouched() {
        let mut kage = Kage::new(json!({"n": "integer"})).unwrap();
        kage.bind(double().input("x", "n").output("value")).unwrap();
        kage.execute(json!({"n": 3})).unwrap();

        let err = kage.execute(json!({"n": "three"})).unwrap_err();
        assert!(matches!(err, KageError::TypeMismatch { .. }));
        assert_eq!(kage.output(), &json!({"value": 6}));
        assert_eq!(kage.result("double"), Some(&json!(6)));
    }
}
