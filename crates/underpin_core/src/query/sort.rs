//! Ordered sort clauses with pluggable comparators.
//!
//! # Responsibility
//! - Parse `field__direction` sort keys.
//! - Sort query results stably by every clause, in declaration order.
//!
//! # Invariants
//! - The first declared clause is the primary key; later clauses only break
//!   ties left by earlier ones.
//! - A comparator failure aborts the sort with that error and leaves the
//!   input order unspecified but complete.

use crate::error::{CoreError, CoreResult};
use crate::query::enums::SortDirection;
use crate::query::field::{FieldResolver, FieldValue};
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Three-way comparison of two items on one field.
pub trait Comparator<V: ?Sized> {
    fn compare(&self, a: &V, b: &V, field: &str, direction: SortDirection)
        -> CoreResult<Ordering>;
}

impl<V: ?Sized, F> Comparator<V> for F
where
    F: Fn(&V, &V, &str, SortDirection) -> CoreResult<Ordering>,
{
    fn compare(
        &self,
        a: &V,
        b: &V,
        field: &str,
        direction: SortDirection,
    ) -> CoreResult<Ordering> {
        self(a, b, field, direction)
    }
}

/// Field-kind aware comparator used when a clause names none.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComparator;

impl<V: FieldResolver + ?Sized> Comparator<V> for DefaultComparator {
    fn compare(
        &self,
        a: &V,
        b: &V,
        field: &str,
        direction: SortDirection,
    ) -> CoreResult<Ordering> {
        let left = a.resolve_field(field).unwrap_or(FieldValue::Null);
        let right = b.resolve_field(field).unwrap_or(FieldValue::Null);
        compare_values(&left, &right).map(|natural| direction.apply(natural))
    }
}

/// Natural ordering of two field values.
///
/// Numbers compare numerically, booleans and absent values by truthiness,
/// lists and nested registries by size, timestamps by epoch seconds, and
/// everything else as strings.
pub fn compare_values(a: &FieldValue, b: &FieldValue) -> CoreResult<Ordering> {
    use FieldValue::{Bool, Count, List, Null, Timestamp};

    if let (Some(left), Some(right)) = (a.as_f64(), b.as_f64()) {
        return Ok(left.partial_cmp(&right).unwrap_or(Ordering::Equal));
    }

    match (a, b) {
        (Bool(_) | Null, _) | (_, Bool(_) | Null) => {
            Ok(i64::from(a.is_truthy()).cmp(&i64::from(b.is_truthy())))
        }
        (List(_) | Count(_), List(_) | Count(_)) => Ok(size_of(a).cmp(&size_of(b))),
        (Timestamp(left), Timestamp(right)) => Ok(left.timestamp().cmp(&right.timestamp())),
        _ => match (a.coerce_string(), b.coerce_string()) {
            (Some(left), Some(right)) => Ok(left.cmp(&right)),
            _ => Err(CoreError::operation_failed(
                "sort",
                format!("cannot compare {} with {}", a.kind(), b.kind()),
            )),
        },
    }
}

fn size_of(value: &FieldValue) -> usize {
    match value {
        FieldValue::List(values) => values.len(),
        FieldValue::Count(count) => *count,
        _ => 0,
    }
}

/// One `field__direction` entry.
pub struct SortClause<V: ?Sized> {
    pub field: String,
    pub direction: SortDirection,
    comparator: Rc<dyn Comparator<V>>,
}

impl<V: ?Sized> Clone for SortClause<V> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            direction: self.direction,
            comparator: Rc::clone(&self.comparator),
        }
    }
}

impl<V: ?Sized> Debug for SortClause<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}__{}", self.field, self.direction)
    }
}

/// Parses `field__direction`; a bare field sorts ascending.
pub fn parse_sort_key(key: &str) -> CoreResult<(String, SortDirection)> {
    let key = key.trim();
    let (field, direction) = match key.rsplit_once("__") {
        Some((field, suffix)) => {
            let direction = SortDirection::parse(suffix).ok_or_else(|| {
                CoreError::validation_failed(key, "sort direction must be asc or desc")
            })?;
            (field, direction)
        }
        None => (key, SortDirection::Asc),
    };
    if field.is_empty() {
        return Err(CoreError::validation_failed(key, "sort field must not be empty"));
    }
    Ok((field.to_string(), direction))
}

/// Ordered list of sort clauses.
pub struct Sort<V: ?Sized> {
    clauses: Vec<SortClause<V>>,
}

impl<V: ?Sized + 'static> Sort<V> {
    pub fn new() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    pub fn by_with(
        mut self,
        field: &str,
        direction: SortDirection,
        comparator: impl Comparator<V> + 'static,
    ) -> Self {
        self.clauses.push(SortClause {
            field: field.to_string(),
            direction,
            comparator: Rc::new(comparator),
        });
        self
    }

    /// Adds a `field__direction` clause with an explicit comparator.
    pub fn key_with(self, key: &str, comparator: impl Comparator<V> + 'static) -> CoreResult<Self> {
        let (field, direction) = parse_sort_key(key)?;
        Ok(self.by_with(&field, direction, comparator))
    }

    pub fn clauses(&self) -> &[SortClause<V>] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn compare(&self, a: &V, b: &V) -> CoreResult<Ordering> {
        for clause in &self.clauses {
            let ordering = clause
                .comparator
                .compare(a, b, &clause.field, clause.direction)?;
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }
}

impl<V: FieldResolver + ?Sized + 'static> Sort<V> {
    pub fn by(self, field: &str, direction: SortDirection) -> Self {
        self.by_with(field, direction, DefaultComparator)
    }

    pub fn asc(self, field: &str) -> Self {
        self.by(field, SortDirection::Asc)
    }

    pub fn desc(self, field: &str) -> Self {
        self.by(field, SortDirection::Desc)
    }

    /// Builds a sort from `field__direction` keys using the default
    /// comparator.
    pub fn from_keys<K: AsRef<str>>(keys: impl IntoIterator<Item = K>) -> CoreResult<Self> {
        let mut sort = Self::new();
        for key in keys {
            sort = sort.key_with(key.as_ref(), DefaultComparator)?;
        }
        Ok(sort)
    }
}

impl<V: 'static> Sort<V> {
    /// Stable in-place sort of keyed entries.
    pub fn apply_entries(&self, entries: &mut [(String, V)]) -> CoreResult<()> {
        self.apply_by(entries, |(_, value)| value)
    }

    /// Stable in-place sort of bare values.
    pub fn apply(&self, values: &mut [V]) -> CoreResult<()> {
        self.apply_by(values, |value| value)
    }

    fn apply_by<E>(&self, entries: &mut [E], project: impl Fn(&E) -> &V) -> CoreResult<()> {
        if self.clauses.is_empty() {
            return Ok(());
        }
        let mut failure: Option<CoreError> = None;
        entries.sort_by(|a, b| match self.compare(project(a), project(b)) {
            Ok(ordering) => ordering,
            Err(err) => {
                failure.get_or_insert(err);
                Ordering::Equal
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<V: ?Sized + 'static> Default for Sort<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ?Sized> Clone for Sort<V> {
    fn clone(&self) -> Self {
        Self {
            clauses: self.clauses.clone(),
        }
    }
}
