//! Function bindings
//!
//! A binding ties an [`Operation`] to the document: which data key feeds each
//! parameter, where the result goes in the output, and which other bindings
//! must run first.

use smallvec::SmallVec;

use crate::error::{KageError, Result};
use crate::operation::Operation;

/// Stack-allocated deps: most bindings have 0-4 dependencies
pub type DepVec = SmallVec<[String; 4]>;

/// A registered operation plus its wiring
pub struct FunctionBinding {
    name: String,
    operation: Box<dyn Operation>,
    /// parameter name → data key (dot path or binding name), in insertion order
    input_mapping: Vec<(String, String)>,
    output_key: Option<String>,
    dependencies: DepVec,
}

impl FunctionBinding {
    /// Bind an operation; the binding is named after the operation by default
    pub fn new(operation: impl Operation + 'static) -> Self {
        Self {
            name: operation.name().to_string(),
            operation: Box::new(operation),
            input_mapping: Vec::new(),
            output_key: None,
            dependencies: DepVec::new(),
        }
    }

    /// Map a parameter to a data key
    pub fn input(mut self, param: impl Into<String>, data_key: impl Into<String>) -> Self {
        let param = param.into();
        let data_key = data_key.into();
        match self.input_mapping.iter_mut().find(|(p, _)| *p == param) {
            Some(entry) => entry.1 = data_key,
            None => self.input_mapping.push((param, data_key)),
        }
        self
    }

    /// Map several parameters at once
    pub fn inputs<I, P, K>(self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (P, K)>,
        P: Into<String>,
        K: Into<String>,
    {
        mapping
            .into_iter()
            .fold(self, |binding, (param, key)| binding.input(param, key))
    }

    /// Write the result at this dot path of the output document
    pub fn output(mut self, output_key: impl Into<String>) -> Self {
        self.output_key = Some(output_key.into());
        self
    }

    /// Require another binding to run first
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    pub fn dependencies<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(self, |binding, name| binding.depends_on(name))
    }

    /// Override the binding name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self) -> &dyn Operation {
        self.operation.as_ref()
    }

    pub fn input_mapping(&self) -> &[(String, String)] {
        &self.input_mapping
    }

    pub fn output_key(&self) -> Option<&str> {
        self.output_key.as_deref()
    }

    pub fn get_dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn depends_on_binding(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }

    /// Check every mapped parameter is declared by the operation
    pub fn validate_parameters(&self) -> Result<()> {
        for (param, _) in &self.input_mapping {
            if !self.operation.has_parameter(param) {
                return Err(KageError::UnknownParameter {
                    param: param.clone(),
                    binding: self.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for FunctionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionBinding")
            .field("name", &self.name)
            .field("parameters", &self.operation.parameters())
            .field("input_mapping", &self.input_mapping)
            .field("output_key", &self.output_key)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::operation;
    use serde_json::json;

    fn double() -> impl Operation {
        operation("double", ["x"], |args| Ok(json!(args.parse::<i64>("x")? * 2)))
    }

    #[test]
    fn name_defaults_to_operation_name() {
        let binding = FunctionBinding::new(double());
        assert_eq!(binding.name(), "double");
        assert_eq!(FunctionBinding::new(double()).named("twice").name(), "twice");
    }

    #[test]
    fn builder_collects_wiring() {
        let binding = FunctionBinding::new(double())
            .input("x", "n")
            .output("result.value")
            .dependencies(["load", "parse"]);

        assert_eq!(binding.input_mapping(), &[("x".to_string(), "n".to_string())]);
        assert_eq!(binding.output_key(), Some("result.value"));
        assert_eq!(binding.get_dependencies(), &["load", "parse"]);
        assert!(binding.depends_on_binding("parse"));
    }

    #[test]
    fn remapping_a_parameter_replaces_it() {
        let binding = FunctionBinding::new(double()).input("x", "a").input("x", "b");
        assert_eq!(binding.input_mapping(), &[("x".to_string(), "b".to_string())]);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let binding = FunctionBinding::new(double()).inputs([("x", "n"), ("y", "m")]);
        let err = binding.validate_parameters().unwrap_err();
        assert!(matches!(
            err,
            KageError::UnknownParameter { ref param, ref binding } if param == "y" && binding == "double"
        ));
    }
}
