//! Dependency-aware items and their resolver.

pub mod item;
pub mod resolver;

pub use item::{DependentItem, Identifiable, ItemDependencies, ItemId, DEFAULT_PRIORITY};
pub use resolver::{DependencyResolver, DetachReason};
