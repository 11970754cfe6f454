//! Core registries, broadcasting and severity logging for Underpin.
//! Adapter layers (menus, routes, templates, storage) build on the `add`,
//! `get`, `notify` and `log` contracts exposed here.

pub mod config;
pub mod dependency;
pub mod error;
pub mod event;
pub mod logger;
pub mod logging;
pub mod query;
pub mod registry;

pub use config::{CoreConfig, LoggerConfig, LoggingConfig};
pub use dependency::{
    DependencyResolver, DependentItem, Identifiable, ItemDependencies, ItemId,
};
pub use error::{CoreError, CoreResult};
pub use event::{Accumulator, CallbackObserver, Observer, Subject};
pub use logger::{EventType, LogItem, LoggedEvent, Logger, MuteGuard, Severity};
pub use logging::{default_log_level, init_logging, logging_status};
pub use query::{
    FieldResolver, FieldValue, Filter, FilterOperator, RegistryQuery, Sort, SortDirection,
};
pub use registry::{
    FeatureExtension, Middleware, ObjectRegistry, ObjectSpec, Registry, RegistryObject,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
