//! Named operations
//!
//! An [`Operation`] declares its parameter names up front so bindings can be
//! checked at registration time, and is invoked with a name → value map.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A unit of work the engine can bind and call
pub trait Operation {
    /// Default binding name
    fn name(&self) -> &str;

    /// Declared parameter names
    fn parameters(&self) -> &[String];

    /// Run the operation once with its resolved arguments
    fn invoke(&self, args: &Args) -> anyhow::Result<Value>;

    fn has_parameter(&self, name: &str) -> bool {
        self.parameters().iter().any(|p| p == name)
    }
}

/// Arguments passed to an operation (parameter name → value)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Map<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get an argument, failing if it was not mapped
    pub fn value(&self, name: &str) -> anyhow::Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("missing argument '{name}'"))
    }

    /// Deserialize an argument into a concrete type
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<T> {
        let value = self.value(name)?;
        serde_json::from_value(value.clone())
            .map_err(|e| anyhow::anyhow!("argument '{name}' has the wrong shape: {e}"))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Arguments as a JSON object (for logging)
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl FromIterator<(String, Value)> for Args {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Operation backed by a closure
pub struct FnOperation<F> {
    name: String,
    parameters: Vec<String>,
    func: F,
}

impl<F> FnOperation<F>
where
    F: Fn(&Args) -> anyhow::Result<Value>,
{
    pub fn new<I, S>(name: impl Into<String>, parameters: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            func,
        }
    }
}

impl<F> Operation for FnOperation<F>
where
    F: Fn(&Args) -> anyhow::Result<Value>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[String] {
        &self.parameters
    }

    fn invoke(&self, args: &Args) -> anyhow::Result<Value> {
        (self.func)(args)
    }
}

impl<F> std::fmt::Debug for FnOperation<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOperation")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Shorthand for [`FnOperation::new`]
pub fn operation<F, I, S>(name: impl Into<String>, parameters: I, func: F) -> FnOperation<F>
where
    F: Fn(&Args) -> anyhow::Result<Value>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FnOperation::new(name, parameters, func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closure_operation_exposes_parameters() {
        let op = operation("add", ["a", "b"], |args| {
            Ok(json!(args.parse::<i64>("a")? + args.parse::<i64>("b")?))
        });
        assert_eq!(op.name(), "add");
        assert!(op.has_parameter("a"));
        assert!(!op.has_parameter("c"));

        let args: Args = [("a".to_string(), json!(2)), ("b".to_string(), json!(3))]
            .into_iter()
            .collect();
        assert_eq!(op.invoke(&args).unwrap(), json!(5));
    }

    #[test]
    fn missing_and_malformed_arguments_fail() {
        let mut args = Args::new();
        args.insert("x", json!("not a number"));

        assert!(args.value("y").is_err());
        assert!(args.parse::<i64>("x").is_err());
        assert_eq!(args.parse::<String>("x").unwrap(), "not a number");
    }
}
