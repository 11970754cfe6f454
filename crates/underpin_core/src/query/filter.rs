//! Predicate DSL over keyed snapshots.
//!
//! # Responsibility
//! - Parse `field__operator` clause keys into typed clauses.
//! - Evaluate clauses as set intersections against resolved field values.
//!
//! # Invariants
//! - `key__in` / `key__not_in` match registry keys and run before any other
//!   clause.
//! - A field the item cannot resolve makes its clause pass.
//! - The first failing clause excludes the item.
//! - `equals` compares the whole resolved value against one expected value.

use crate::error::{CoreError, CoreResult};
use crate::query::enums::FilterOperator;
use crate::query::field::{FieldResolver, FieldValue};
use crate::query::registry_query::Queryable;
use once_cell::sync::Lazy;
use regex::Regex;

/// Pseudo-field matching the item's type tags instead of data.
pub const INSTANCEOF_FIELD: &str = "instanceof";
/// Pseudo-field matching the registry key.
pub const KEY_FIELD: &str = "key";

static CLAUSE_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<field>[A-Za-z_][A-Za-z0-9_]*?)(?:__(?P<op>not_in|in|and|equals))?$")
        .expect("valid clause key regex")
});

/// One parsed filter clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub operator: FilterOperator,
    pub values: Vec<FieldValue>,
}

impl FilterClause {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        values: Vec<FieldValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            values,
        }
    }

    /// Parses `field__operator`; a bare field means `in`.
    pub fn parse(key: &str, values: Vec<FieldValue>) -> CoreResult<Self> {
        let captures = CLAUSE_KEY_RE.captures(key.trim()).ok_or_else(|| {
            CoreError::validation_failed(key, "filter clause key must be `field` or `field__operator`")
        })?;
        let field = &captures["field"];
        if field.contains("__") {
            return Err(CoreError::validation_failed(
                key,
                "unknown filter operator; expected in|not_in|and|equals",
            ));
        }
        let operator = captures
            .name("op")
            .and_then(|op| FilterOperator::parse(op.as_str()))
            .unwrap_or(FilterOperator::In);
        Ok(Self::new(field, operator, values))
    }

    /// Evaluates this clause against one item.
    pub fn passes<V: FieldResolver + ?Sized>(&self, item: &V) -> bool {
        let resolved = if self.field == INSTANCEOF_FIELD {
            FieldValue::List(item.type_tags().into_iter().map(FieldValue::from).collect())
        } else {
            match item.resolve_field(&self.field) {
                Some(value) => value,
                None => return true,
            }
        };

        let expected = distinct(self.values.iter());
        let intersection = distinct(
            resolved
                .members()
                .into_iter()
                .filter(|member| expected.contains(member)),
        );

        match self.operator {
            FilterOperator::In => !intersection.is_empty(),
            FilterOperator::NotIn => intersection.is_empty(),
            FilterOperator::And => intersection.len() == expected.len(),
            FilterOperator::Equals => match expected.as_slice() {
                [value] => resolved == **value,
                _ => false,
            },
        }
    }
}

/// Conjunction of clauses plus the registry-key prefilter.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<FilterClause>,
    key_in: Option<Vec<String>>,
    key_not_in: Option<Vec<String>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from `field__operator => values` pairs.
    pub fn from_clauses<K, I>(clauses: I) -> CoreResult<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Vec<FieldValue>)>,
    {
        let mut filter = Self::new();
        for (key, values) in clauses {
            filter.push(FilterClause::parse(key.as_ref(), values)?);
        }
        Ok(filter)
    }

    pub fn is_in<T: Into<FieldValue>>(
        mut self,
        field: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.push(FilterClause::new(field, FilterOperator::In, collect(values)));
        self
    }

    pub fn not_in<T: Into<FieldValue>>(
        mut self,
        field: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.push(FilterClause::new(field, FilterOperator::NotIn, collect(values)));
        self
    }

    pub fn and<T: Into<FieldValue>>(
        mut self,
        field: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.push(FilterClause::new(field, FilterOperator::And, collect(values)));
        self
    }

    pub fn equals(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.push(FilterClause::new(
            field,
            FilterOperator::Equals,
            vec![value.into()],
        ));
        self
    }

    /// Adds one clause; key clauses go to the prefilter.
    pub fn push(&mut self, clause: FilterClause) {
        if clause.field == KEY_FIELD {
            let keys = clause.values.iter().filter_map(FieldValue::coerce_string);
            match clause.operator {
                FilterOperator::In => {
                    self.key_in.get_or_insert_with(Vec::new).extend(keys);
                    return;
                }
                FilterOperator::NotIn => {
                    self.key_not_in.get_or_insert_with(Vec::new).extend(keys);
                    return;
                }
                FilterOperator::And | FilterOperator::Equals => {}
            }
        }
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty() && self.key_in.is_none() && self.key_not_in.is_none()
    }

    pub fn key_allowed(&self, key: &str) -> bool {
        if let Some(allowed) = &self.key_in {
            if !allowed.iter().any(|candidate| candidate == key) {
                return false;
            }
        }
        if let Some(denied) = &self.key_not_in {
            if denied.iter().any(|candidate| candidate == key) {
                return false;
            }
        }
        true
    }

    /// Evaluates the data clauses against one item.
    pub fn matches<V: FieldResolver + ?Sized>(&self, item: &V) -> bool {
        self.clauses.iter().all(|clause| clause.passes(item))
    }

    /// Matching entries with their keys, in snapshot order.
    pub fn filter_entries<R: Queryable>(&self, source: &R) -> Vec<(String, R::Item)> {
        source
            .entries()
            .into_iter()
            .filter(|(key, _)| self.key_allowed(key))
            .filter(|(_, item)| self.matches(*item))
            .map(|(key, item)| (key.to_string(), item.clone()))
            .collect()
    }

    /// First match in snapshot order.
    pub fn find<R: Queryable>(&self, source: &R) -> Option<R::Item> {
        source
            .entries()
            .into_iter()
            .filter(|(key, _)| self.key_allowed(key))
            .find(|(_, item)| self.matches(*item))
            .map(|(_, item)| item.clone())
    }

    /// Every match in snapshot order; keys are dropped.
    pub fn filter<R: Queryable>(&self, source: &R) -> Vec<R::Item> {
        self.filter_entries(source)
            .into_iter()
            .map(|(_, item)| item)
            .collect()
    }

    pub fn get_results<R: Queryable>(&self, source: &R) -> Vec<R::Item> {
        self.filter(source)
    }
}

fn collect<T: Into<FieldValue>>(values: impl IntoIterator<Item = T>) -> Vec<FieldValue> {
    values.into_iter().map(Into::into).collect()
}

fn distinct<'a>(values: impl Iterator<Item = &'a FieldValue>) -> Vec<&'a FieldValue> {
    let mut unique: Vec<&FieldValue> = Vec::new();
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}
