//! Error taxonomy shared by registries, queries and the event core.
//!
//! # Responsibility
//! - Name every failure a caller must decide on explicitly.
//! - Keep messages stable enough for adapter layers to surface as diagnostics.
//!
//! # Invariants
//! - Registry insert/lookup failures are always returned, never swallowed.
//! - Dependency-resolution and logger failures never become `CoreError`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

/// Failure kinds raised by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Value rejected by `validate_item` (duplicate key, empty key, wrong
    /// abstraction, unresolvable object spec).
    InvalidRegistryItem {
        registry: String,
        key: String,
        expected: String,
        found: String,
        reason: String,
    },
    /// Lookup miss.
    UnknownRegistryItem { registry: String, key: String },
    /// Generic downstream failure, e.g. incomparable sort values.
    OperationFailed { operation: String, message: String },
    /// Typed value rejected (config values, clause keys).
    ValidationFailed { field: String, message: String },
}

impl CoreError {
    pub(crate) fn operation_failed(operation: &str, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn validation_failed(field: &str, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRegistryItem { .. } => "invalid_registry_item",
            Self::UnknownRegistryItem { .. } => "unknown_registry_item",
            Self::OperationFailed { .. } => "operation_failed",
            Self::ValidationFailed { .. } => "validation_failed",
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRegistryItem {
                registry,
                key,
                expected,
                found,
                reason,
            } => write!(
                f,
                "invalid item `{key}` for registry `{registry}`: {reason} (expected {expected}, got {found})"
            ),
            Self::UnknownRegistryItem { registry, key } => {
                write!(f, "unknown item `{key}` in registry `{registry}`")
            }
            Self::OperationFailed { operation, message } => {
                write!(f, "operation `{operation}` failed: {message}")
            }
            Self::ValidationFailed { field, message } => {
                write!(f, "validation failed for `{field}`: {message}")
            }
        }
    }
}

impl Error for CoreError {}
