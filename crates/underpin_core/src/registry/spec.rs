//! Object construction specs resolved at the registry boundary.
//!
//! # Responsibility
//! - Model the three accepted shapes of an added value: a built instance, a
//!   bare factory name, or a `class` + `args` map.
//! - Turn any shape into an instance through named factories.
//!
//! # Invariants
//! - A spec map without `class` uses the configured default factory.
//! - Unknown factory names never construct anything.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Constructor for one named implementation. `Err` carries the reason.
pub type Factory<T> = Rc<dyn Fn(&[Value]) -> Result<Rc<T>, String>>;

/// Accepted shapes for a value handed to `ObjectRegistry::add`.
pub enum ObjectSpec<T: ?Sized> {
    /// Already-built instance, stored as-is.
    Instance(Rc<T>),
    /// Factory name, invoked with no arguments.
    Named(String),
    /// Factory name (or the default factory) invoked with `args`.
    Spec {
        class: Option<String>,
        args: Vec<Value>,
    },
}

impl<T: ?Sized> ObjectSpec<T> {
    pub fn spec(class: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Spec {
            class: Some(class.into()),
            args,
        }
    }

    pub fn default_with(args: Vec<Value>) -> Self {
        Self::Spec { class: None, args }
    }

    /// Reads a JSON spec: a string is a factory name, an object carries
    /// optional `class` and `args` keys.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(name) => Ok(Self::Named(name.clone())),
            Value::Object(map) => {
                let class = match map.get("class") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(name)) => Some(name.clone()),
                    Some(other) => return Err(format!("`class` must be a string, got {other}")),
                };
                let args = match map.get("args") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(values)) => values.clone(),
                    Some(single) => vec![single.clone()],
                };
                Ok(Self::Spec { class, args })
            }
            other => Err(format!("unsupported object spec: {other}")),
        }
    }

    /// Short description used in validation errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Instance(_) => "instance".to_string(),
            Self::Named(name) => format!("factory `{name}`"),
            Self::Spec {
                class: Some(name),
                args,
            } => format!("factory `{name}` with {} args", args.len()),
            Self::Spec { class: None, args } => {
                format!("default factory with {} args", args.len())
            }
        }
    }
}

impl<T: ?Sized> From<Rc<T>> for ObjectSpec<T> {
    fn from(value: Rc<T>) -> Self {
        Self::Instance(value)
    }
}

impl<T: ?Sized> From<&str> for ObjectSpec<T> {
    fn from(value: &str) -> Self {
        Self::Named(value.to_string())
    }
}

impl<T: ?Sized> From<String> for ObjectSpec<T> {
    fn from(value: String) -> Self {
        Self::Named(value)
    }
}

impl<T: ?Sized> Debug for ObjectSpec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Named factories plus an optional default.
pub struct ObjectFactory<T: ?Sized> {
    factories: BTreeMap<String, Factory<T>>,
    default_factory: Option<String>,
}

impl<T: ?Sized> ObjectFactory<T> {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            default_factory: None,
        }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&[Value]) -> Result<Rc<T>, String> + 'static,
    ) {
        self.factories.insert(name.into(), Rc::new(factory));
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default_factory = Some(name.into());
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn factory_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Resolves any spec shape into an instance.
    pub fn build(&self, spec: ObjectSpec<T>) -> Result<Rc<T>, String> {
        match spec {
            ObjectSpec::Instance(instance) => Ok(instance),
            ObjectSpec::Named(name) => self.invoke(&name, &[]),
            ObjectSpec::Spec {
                class: Some(name),
                args,
            } => self.invoke(&name, &args),
            ObjectSpec::Spec { class: None, args } => match &self.default_factory {
                Some(name) => self.invoke(name, &args),
                None => Err("spec has no `class` and no default factory is set".to_string()),
            },
        }
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Result<Rc<T>, String> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| format!("no factory registered for `{name}`"))?;
        factory(args)
    }
}

impl<T: ?Sized> Default for ObjectFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for ObjectFactory<T> {
    fn clone(&self) -> Self {
        Self {
            factories: self.factories.clone(),
            default_factory: self.default_factory.clone(),
        }
    }
}
