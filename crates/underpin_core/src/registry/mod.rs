//! Keyed registries: the generic store, typed object registries and the
//! object specs resolved when items are added.
//!
//! # Responsibility
//! - Own the CRUD contract every collection in the core builds on.
//! - Keep abstraction checks and lifecycle hooks at the registry boundary.
//!
//! # Invariants
//! - Registry keys are unique per instance.
//! - Registries produced by `seed` never alias source storage.

pub mod keyed;
pub mod object;
pub mod spec;

pub use keyed::{ItemValidator, Registry};
pub use object::{FeatureExtension, Middleware, ObjectRegistry, RegistryObject};
pub use spec::{Factory, ObjectFactory, ObjectSpec};
