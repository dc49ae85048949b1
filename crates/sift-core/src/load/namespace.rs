//! The namespace a load produces.

use rustc_hash::FxHashMap;

use super::value::Value;

/// A named, insertion-ordered set of bindings.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    name: String,
    bindings: FxHashMap<String, Value>,
    order: Vec<String>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// The display name this namespace was loaded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind `name` to `value`, keeping first-insertion order on rebind.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if self.bindings.insert(name.clone(), value).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order
            .iter()
            .filter_map(|name| self.bindings.get(name).map(|v| (name.as_str(), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_iterate_in_insertion_order() {
        let mut ns = Namespace::new("m");
        ns.set("b", Value::Int(2));
        ns.set("a", Value::Int(1));
        ns.set("c", Value::Int(3));

        let names: Vec<&str> = ns.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn rebinding_replaces_without_reordering() {
        let mut ns = Namespace::new("m");
        ns.set("a", Value::Int(1));
        ns.set("b", Value::Int(2));
        ns.set("a", Value::Int(10));

        assert_eq!(ns.len(), 2);
        assert_eq!(ns.get("a"), Some(&Value::Int(10)));
        let names: Vec<&str> = ns.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
