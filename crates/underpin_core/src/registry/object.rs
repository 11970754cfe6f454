//! Typed object registry with lifecycle hooks.
//!
//! # Responsibility
//! - Restrict a keyed registry to one abstraction `T`.
//! - Resolve object specs into instances at the `add` boundary.
//! - Fire middleware and feature-extension hooks once per successful `add`.
//!
//! # Invariants
//! - Only values that are `T` are ever stored; the type system enforces the
//!   abstraction, factories enforce it for name/spec inputs.
//! - The middleware hook runs before the feature-extension hook.
//! - `seed` never re-runs lifecycle hooks.

use crate::error::{CoreError, CoreResult};
use crate::logger::{LogItem, Logger};
use crate::registry::keyed::Registry;
use crate::registry::spec::{ObjectFactory, ObjectSpec};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::any::type_name;
use std::rc::Rc;

/// One-time run hook fired first during `init_object`.
pub trait Middleware {
    fn run_middleware(&self);
}

/// Registration hook fired after middleware during `init_object`.
pub trait FeatureExtension {
    fn do_actions(&self);
}

/// Capability probe implemented by everything stored in an
/// [`ObjectRegistry`]. Both capabilities default to absent.
pub trait RegistryObject {
    fn as_middleware(&self) -> Option<&dyn Middleware> {
        None
    }

    fn as_feature_extension(&self) -> Option<&dyn FeatureExtension> {
        None
    }
}

/// Keyed registry restricted to instances of `T`.
pub struct ObjectRegistry<T: ?Sized> {
    items: Registry<Rc<T>>,
    factory: ObjectFactory<T>,
    logger: Option<Rc<Logger>>,
}

impl<T: RegistryObject + ?Sized + 'static> ObjectRegistry<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            items: Registry::new(name),
            factory: ObjectFactory::new(),
            logger: None,
        }
    }

    /// Registers a named factory used by name and spec-map inputs.
    pub fn with_factory(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&[Value]) -> Result<Rc<T>, String> + 'static,
    ) -> Self {
        self.register_factory(name, factory);
        self
    }

    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&[Value]) -> Result<Rc<T>, String> + 'static,
    ) {
        self.factory.register(name, factory);
    }

    /// Names the factory used for spec maps that omit `class`.
    pub fn with_default_factory(mut self, name: impl Into<String>) -> Self {
        self.factory.set_default(name);
        self
    }

    /// Routes lifecycle diagnostics to a severity logger.
    pub fn with_logger(mut self, logger: Rc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn set_logger(&mut self, logger: Option<Rc<Logger>>) {
        self.logger = logger;
    }

    pub fn logger(&self) -> Option<&Rc<Logger>> {
        self.logger.as_ref()
    }

    pub fn name(&self) -> &str {
        self.items.name()
    }

    /// Name of the abstraction this registry accepts.
    pub fn abstraction(&self) -> &'static str {
        type_name::<T>()
    }

    /// Resolves `spec`, stores the instance, then runs `init_object`.
    pub fn add(&mut self, key: impl Into<String>, spec: ObjectSpec<T>) -> CoreResult<&mut Self> {
        let key = key.into();
        let found = spec.describe();
        let object = self
            .factory
            .build(spec)
            .map_err(|reason| CoreError::InvalidRegistryItem {
                registry: self.items.name().to_string(),
                key: key.clone(),
                expected: self.abstraction().to_string(),
                found,
                reason,
            })?;

        self.items.add(key.clone(), object)?;
        self.trace(&key, "registry_item_added", "item added");
        self.init_object(&key)?;
        Ok(self)
    }

    pub fn add_instance(&mut self, key: impl Into<String>, object: Rc<T>) -> CoreResult<&mut Self> {
        self.add(key, ObjectSpec::Instance(object))
    }

    /// Runs the lifecycle hooks of the item stored under `key`.
    pub fn init_object(&self, key: &str) -> CoreResult<()> {
        let object = self.get(key)?;
        if let Some(middleware) = object.as_middleware() {
            middleware.run_middleware();
            self.trace(key, "middleware_ran", "middleware run hook fired");
        }
        if let Some(extension) = object.as_feature_extension() {
            extension.do_actions();
            self.trace(key, "extension_registered", "extension registration hook fired");
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> CoreResult<Rc<T>> {
        self.items.get(key).cloned()
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.items.is_registered(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Rc<T>> {
        self.items.remove(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<T>)> {
        self.items.iter()
    }

    pub fn values(&self) -> Vec<Rc<T>> {
        self.items.map(|_, value| Rc::clone(value))
    }

    pub fn to_array(&self) -> IndexMap<String, Rc<T>> {
        self.items.to_array()
    }

    /// Independent registry with the same factories and logger, holding
    /// `items`. Lifecycle hooks are not re-run.
    pub fn seed(&self, items: impl IntoIterator<Item = (String, Rc<T>)>) -> CoreResult<Self> {
        Ok(Self {
            items: self.items.seed(items)?,
            factory: self.factory.clone(),
            logger: self.logger.clone(),
        })
    }

    pub fn as_registry(&self) -> &Registry<Rc<T>> {
        &self.items
    }

    fn trace(&self, key: &str, code: &str, message: &str) {
        match &self.logger {
            Some(logger) => {
                logger.log(
                    "debug",
                    LogItem::new(code, message)
                        .with_data("key", key)
                        .with_data("registry", self.items.name()),
                );
            }
            None => debug!(
                "event={code} module=registry registry={} key={key}",
                self.items.name()
            ),
        }
    }
}

impl<T: ?Sized> Clone for ObjectRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            factory: self.factory.clone(),
            logger: self.logger.clone(),
        }
    }
}
