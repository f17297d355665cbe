//! Binding result storage
//!
//! Results are kept by binding name and remember the order they were
//! produced in, which is the execution order.

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde_json::Value;

/// Result of one binding execution
#[derive(Debug, Clone, PartialEq)]
pub struct BindingResult {
    /// Raw value returned by the operation
    pub output: Value,
    /// Execution duration
    pub duration: Duration,
}

impl BindingResult {
    pub fn new(output: Value, duration: Duration) -> Self {
        Self { output, duration }
    }
}

/// Results of one execution pass, in production order
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    order: Vec<String>,
    results: FxHashMap<String, BindingResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a binding result (re-inserting keeps the original position)
    pub fn insert(&mut self, name: impl Into<String>, result: BindingResult) {
        let name = name.into();
        if !self.results.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.results.insert(name, result);
    }

    pub fn get(&self, name: &str) -> Option<&BindingResult> {
        self.results.get(name)
    }

    /// Get just the output value of a binding
    pub fn get_output(&self, name: &str) -> Option<&Value> {
        self.results.get(name).map(|r| &r.output)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.results.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate results in production order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindingResult)> {
        self.order
            .iter()
            .filter_map(|name| self.results.get(name).map(|r| (name.as_str(), r)))
    }

    /// Total time spent inside operations
    pub fn total_duration(&self) -> Duration {
        self.results.values().map(|r| r.duration).sum()
    }
}
