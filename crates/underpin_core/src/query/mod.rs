//! Filter and sort DSL over keyed snapshots.
//!
//! # Responsibility
//! - Select items with `field__operator` clauses.
//! - Order items with `field__direction` clauses and pluggable comparators.
//! - Materialize results as independent registries of the source kind.
//!
//! # Invariants
//! - Queries never mutate the registry they read.

pub mod enums;
pub mod field;
pub mod filter;
pub mod registry_query;
pub mod sort;

pub use enums::{FilterOperator, SortDirection};
pub use field::{FieldResolver, FieldValue};
pub use filter::{Filter, FilterClause};
pub use registry_query::{Queryable, RegistryQuery};
pub use sort::{compare_values, Comparator, DefaultComparator, Sort, SortClause};
