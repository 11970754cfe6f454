//! Identifiable and dependency-aware item contracts.

use crate::query::field::{FieldResolver, FieldValue};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Priority given to items that do not choose one.
pub const DEFAULT_PRIORITY: i64 = 10;

/// Stable item identifier, distinct from any registry key.
///
/// # Invariants
/// - Ids built through `From` or deserialized are canonical: a name that is
///   the decimal form of an `i64` becomes `Number`, so `1` and `"1"` are the
///   same id everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawItemId", into = "RawItemId")]
pub enum ItemId {
    Number(i64),
    Name(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawItemId {
    Number(i64),
    Name(String),
}

impl From<RawItemId> for ItemId {
    fn from(raw: RawItemId) -> Self {
        match raw {
            RawItemId::Number(value) => Self::Number(value),
            RawItemId::Name(value) => Self::from(value),
        }
    }
}

impl From<ItemId> for RawItemId {
    fn from(id: ItemId) -> Self {
        match id {
            ItemId::Number(value) => Self::Number(value),
            ItemId::Name(value) => Self::Name(value),
        }
    }
}

/// Integer value of `name` when it is exactly the decimal form of one.
fn canonical_number(name: &str) -> Option<i64> {
    name.parse::<i64>()
        .ok()
        .filter(|number| number.to_string() == name)
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Name(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        match canonical_number(value) {
            Some(number) => Self::Number(number),
            None => Self::Name(value.to_string()),
        }
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        match canonical_number(&value) {
            Some(number) => Self::Number(number),
            None => Self::Name(value),
        }
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ItemId {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<&ItemId> for FieldValue {
    fn from(value: &ItemId) -> Self {
        match value {
            ItemId::Number(number) => FieldValue::Int(*number),
            ItemId::Name(name) => FieldValue::Text(name.clone()),
        }
    }
}

/// Exposes a stable id.
pub trait Identifiable {
    fn id(&self) -> &ItemId;
}

/// Item ordered by the dependency resolver.
pub trait DependentItem: Identifiable {
    fn priority(&self) -> i64;
    fn dependencies(&self) -> &[ItemId];
    fn add_dependency(&mut self, id: ItemId);
    fn remove_dependency(&mut self, id: &ItemId);
}

/// Reusable id, priority and dependency list for implementors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDependencies {
    pub id: ItemId,
    pub priority: i64,
    pub dependencies: Vec<ItemId>,
}

impl ItemDependencies {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            priority: DEFAULT_PRIORITY,
            dependencies: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn depends_on(mut self, id: impl Into<ItemId>) -> Self {
        self.add_dependency(id.into());
        self
    }
}

impl Identifiable for ItemDependencies {
    fn id(&self) -> &ItemId {
        &self.id
    }
}

impl DependentItem for ItemDependencies {
    fn priority(&self) -> i64 {
        self.priority
    }

    fn dependencies(&self) -> &[ItemId] {
        &self.dependencies
    }

    fn add_dependency(&mut self, id: ItemId) {
        if !self.dependencies.contains(&id) {
            self.dependencies.push(id);
        }
    }

    fn remove_dependency(&mut self, id: &ItemId) {
        self.dependencies.retain(|existing| existing != id);
    }
}

impl FieldResolver for ItemDependencies {
    fn resolve_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::from(&self.id)),
            "priority" => Some(FieldValue::Int(self.priority)),
            "dependencies" => Some(FieldValue::List(
                self.dependencies.iter().map(FieldValue::from).collect(),
            )),
            _ => None,
        }
    }
}
