//! Dependency graph built from function bindings
//!
//! Execution order is computed by layer peeling: each round schedules every
//! binding whose dependencies are all already scheduled. A round that
//! schedules nothing while bindings remain means a cycle or a dependency
//! that was never bound.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::binding::FunctionBinding;
use crate::error::{KageError, Result, StuckBinding};

/// Graph of binding dependencies (borrowed from the engine's binding table)
pub struct FlowGraph<'a> {
    /// Binding names in registration order
    names: Vec<&'a str>,
    /// name -> declared dependencies
    dependencies: FxHashMap<&'a str, &'a [String]>,
}

impl<'a> FlowGraph<'a> {
    pub fn from_bindings(bindings: &'a [FunctionBinding]) -> Self {
        let mut names = Vec::with_capacity(bindings.len());
        let mut dependencies =
            FxHashMap::with_capacity_and_hasher(bindings.len(), Default::default());

        for binding in bindings {
            names.push(binding.name());
            dependencies.insert(binding.name(), binding.get_dependencies());
        }

        Self {
            names,
            dependencies,
        }
    }

    /// Get dependencies of a binding
    #[inline]
    pub fn get_dependencies(&self, name: &str) -> &'a [String] {
        self.dependencies.get(name).copied().unwrap_or(&[])
    }

    /// Check if binding exists
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve a total order where every binding follows its dependencies
    ///
    /// Bindings that become ready in the same round keep registration order.
    pub fn execution_order(&self) -> Result<Vec<String>> {
        let mut resolved: Vec<String> = Vec::with_capacity(self.names.len());
        let mut resolved_set: FxHashSet<&str> = FxHashSet::default();
        let mut remaining: Vec<&str> = self.names.clone();

        while !remaining.is_empty() {
            let ready: Vec<&str> = remaining
                .iter()
                .copied()
                .filter(|name| {
                    self.get_dependencies(name)
                        .iter()
                        .all(|dep| resolved_set.contains(dep.as_str()))
                })
                .collect();

            if ready.is_empty() {
                let stuck = remaining
                    .iter()
                    .map(|name| StuckBinding {
                        name: name.to_string(),
                        missing: self
                            .get_dependencies(name)
                            .iter()
                            .filter(|dep| !resolved_set.contains(dep.as_str()))
                            .cloned()
                            .collect(),
                    })
                    .collect();
                return Err(KageError::UnresolvedDependencies { stuck });
            }

            for name in ready {
                resolved.push(name.to_string());
                resolved_set.insert(name);
            }
            remaining.retain(|name| !resolved_set.contains(name));
        }

        Ok(resolved)
    }
}
