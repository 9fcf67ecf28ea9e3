//! Evaluation environments.

use crate::value::Value;
use rustc_hash::FxHashMap;

/// Binding name the parser's `this` keyword resolves against.
pub const THIS_BINDING: &str = "this";

/// Flat, string-keyed bindings supplied by the host for one evaluation.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    bindings: FxHashMap<String, Value>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Builder form of [`Environment::bind`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bind(name, value);
        self
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Check whether a name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// The value `this` resolves to, if bound.
    pub fn this(&self) -> Option<&Value> {
        self.get(THIS_BINDING)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check whether the environment has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Environment {
            bindings: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_get() {
        let mut env = Environment::new();
        env.bind("x", Value::Number(42.0));
        assert_eq!(env.get("x"), Some(&Value::Number(42.0)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn rebind_replaces() {
        let env = Environment::new()
            .with("x", Value::Number(1.0))
            .with("x", Value::Number(2.0));
        assert_eq!(env.get("x"), Some(&Value::Number(2.0)));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn this_binding() {
        let env = Environment::new().with(THIS_BINDING, Value::string("ctx"));
        assert_eq!(env.this(), Some(&Value::string("ctx")));
        assert_eq!(Environment::new().this(), None);
    }

    #[test]
    fn from_iterator() {
        let env: Environment = [("a", Value::Number(1.0)), ("b", Value::Bool(true))]
            .into_iter()
            .collect();
        assert_eq!(env.len(), 2);
        assert!(env.contains("b"));
    }
}
