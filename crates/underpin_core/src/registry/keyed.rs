//! Generic validated keyed store.
//!
//! # Responsibility
//! - Store values under unique string keys in insertion order.
//! - Expose the CRUD contract every other registry builds on.
//!
//! # Invariants
//! - Keys are unique and non-empty; re-adding a key fails and leaves storage
//!   unchanged.
//! - Snapshot helpers (`to_array`, `map`, `filter`, ...) never mutate storage.
//! - `seed` output never aliases the source map.

use crate::error::{CoreError, CoreResult};
use crate::query::field::{FieldResolver, FieldValue};
use indexmap::IndexMap;
use std::any::type_name;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Extra per-registry validation hook. `Err` carries the rejection reason.
pub type ItemValidator<V> = Rc<dyn Fn(&str, &V) -> Result<(), String>>;

/// Insertion-ordered keyed registry.
pub struct Registry<V> {
    name: String,
    items: IndexMap<String, V>,
    validator: Option<ItemValidator<V>>,
}

impl<V> Registry<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: IndexMap::new(),
            validator: None,
        }
    }

    /// Attaches an extra validation rule checked on every `add`.
    pub fn with_validator(
        mut self,
        validator: impl Fn(&str, &V) -> Result<(), String> + 'static,
    ) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fresh registry with the same name and validation rules, but no items.
    pub fn empty_like(&self) -> Self {
        Self {
            name: self.name.clone(),
            items: IndexMap::new(),
            validator: self.validator.clone(),
        }
    }

    /// Checks whether `value` may be stored under `key`.
    pub fn validate_item(&self, key: &str, value: &V) -> CoreResult<()> {
        let reject = |expected: &str, found: &str, reason: String| CoreError::InvalidRegistryItem {
            registry: self.name.clone(),
            key: key.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
            reason,
        };

        if key.trim().is_empty() {
            return Err(reject(
                "non-empty key",
                "empty key",
                "key must not be empty".to_string(),
            ));
        }
        if self.items.contains_key(key) {
            return Err(reject(
                "unused key",
                "registered key",
                "key is already registered".to_string(),
            ));
        }
        if let Some(validator) = &self.validator {
            validator(key, value)
                .map_err(|reason| reject(type_name::<V>(), "rejected value", reason))?;
        }
        Ok(())
    }

    /// Validates and stores one item.
    pub fn add(&mut self, key: impl Into<String>, value: V) -> CoreResult<&mut Self> {
        let key = key.into();
        self.validate_item(&key, &value)?;
        self.items.insert(key, value);
        Ok(self)
    }

    pub fn get(&self, key: &str) -> CoreResult<&V> {
        self.items.get(key).ok_or_else(|| self.unknown(key))
    }

    pub fn get_mut(&mut self, key: &str) -> CoreResult<&mut V> {
        self.items
            .get_mut(key)
            .ok_or_else(|| CoreError::UnknownRegistryItem {
                registry: self.name.clone(),
                key: key.to_string(),
            })
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Removes one item, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.items.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.items.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn each(&self, mut visit: impl FnMut(&str, &V)) {
        for (key, value) in self.iter() {
            visit(key, value);
        }
    }

    pub fn map<U>(&self, mut transform: impl FnMut(&str, &V) -> U) -> Vec<U> {
        self.iter().map(|(key, value)| transform(key, value)).collect()
    }

    pub fn reduce<A>(&self, init: A, mut step: impl FnMut(A, &str, &V) -> A) -> A {
        self.iter()
            .fold(init, |acc, (key, value)| step(acc, key, value))
    }

    fn unknown(&self, key: &str) -> CoreError {
        CoreError::UnknownRegistryItem {
            registry: self.name.clone(),
            key: key.to_string(),
        }
    }
}

impl<V: Clone> Registry<V> {
    /// Immutable copy of the current contents.
    pub fn to_array(&self) -> IndexMap<String, V> {
        self.items.clone()
    }

    /// Keeps the items matching `predicate`, preserving their keys.
    pub fn filter(&self, mut predicate: impl FnMut(&str, &V) -> bool) -> Self {
        let mut filtered = self.empty_like();
        for (key, value) in self.iter() {
            if predicate(key, value) {
                filtered.items.insert(key.to_string(), value.clone());
            }
        }
        filtered
    }

    /// Builds an independent registry of the same kind from `items`.
    pub fn seed(&self, items: impl IntoIterator<Item = (String, V)>) -> CoreResult<Self> {
        let mut seeded = self.empty_like();
        for (key, value) in items {
            seeded.add(key, value)?;
        }
        Ok(seeded)
    }
}

impl<V: FieldResolver> Registry<V> {
    /// Resolved values of `field`, skipping items that lack it.
    pub fn pluck(&self, field: &str) -> Vec<FieldValue> {
        self.iter()
            .filter_map(|(_, value)| value.resolve_field(field))
            .collect()
    }
}

impl<V: Clone> Clone for Registry<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            items: self.items.clone(),
            validator: self.validator.clone(),
        }
    }
}

impl<V: Debug> Debug for Registry<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("items", &self.items)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::error::CoreError;
    use crate::query::field::FieldValue;
    use serde_json::json;

    #[test]
    fn add_then_get_returns_value() {
        let mut registry = Registry::new("numbers");
        registry
            .add("one", 1)
            .expect("first add")
            .add("two", 2)
            .expect("chained add");
        assert_eq!(*registry.get("one").expect("registered"), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_key_fails_and_keeps_original() {
        let mut registry = Registry::new("numbers");
        registry.add("one", 1).expect("first add");
        let err = registry.add("one", 100).expect_err("duplicate must fail");
        assert!(matches!(
            &err,
            CoreError::InvalidRegistryItem { expected, found, .. }
                if expected == "unused key" && found == "registered key"
        ));
        assert_eq!(*registry.get("one").expect("still registered"), 1);
        assert_eq!(registry.len(), 1);

        let err = registry.add("  ", 5).expect_err("blank key must fail");
        assert!(err.to_string().contains("got empty key"));
    }

    #[test]
    fn get_miss_names_registry() {
        let registry: Registry<i32> = Registry::new("numbers");
        let err = registry.get("nope").expect_err("miss must fail");
        assert_eq!(
            err,
            CoreError::UnknownRegistryItem {
                registry: "numbers".to_string(),
                key: "nope".to_string(),
            }
        );
    }

    #[test]
    fn custom_validator_rejects_values() {
        let mut registry = Registry::new("positive").with_validator(|_, value: &i32| {
            if *value > 0 {
                Ok(())
            } else {
                Err("value must be positive".to_string())
            }
        });
        registry.add("ok", 3).expect("positive accepted");
        let err = registry.add("bad", -3).expect_err("negative rejected");
        assert!(err.to_string().contains("positive"));
        assert!(err.to_string().contains("got rejected value"));
        assert!(!registry.is_registered("bad"));
    }

    #[test]
    fn snapshot_helpers_do_not_mutate() {
        let mut registry = Registry::new("numbers");
        registry.add("a", 1).expect("a");
        registry.add("b", 2).expect("b");
        registry.add("c", 3).expect("c");

        let odd = registry.filter(|_, value| value % 2 == 1);
        assert_eq!(odd.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(registry.reduce(0, |sum, _, value| sum + value), 6);
        assert_eq!(registry.map(|key, _| key.to_string()), vec!["a", "b", "c"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn seed_is_independent_of_source() {
        let mut registry = Registry::new("numbers");
        registry.add("a", 1).expect("a");
        let mut seeded = registry
            .seed(vec![("z".to_string(), 26)])
            .expect("seed");
        seeded.add("y", 25).expect("seeded registry accepts adds");
        assert_eq!(seeded.name(), "numbers");
        assert!(!registry.is_registered("z"));
        assert!(!registry.is_registered("y"));
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut registry = Registry::new("letters");
        for key in ["a", "b", "c"] {
            registry.add(key, key.to_uppercase()).expect("add");
        }
        assert_eq!(registry.remove("b").as_deref(), Some("B"));
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn pluck_skips_unresolvable_fields() {
        let mut registry = Registry::new("docs");
        registry.add("1", json!({"n": 1})).expect("1");
        registry.add("2", json!({"m": 2})).expect("2");
        assert_eq!(registry.pluck("n"), vec![FieldValue::Int(1)]);
    }
}
