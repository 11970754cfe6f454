//! Filter-then-sort queries that re-seed results into the source registry
//! kind.

use crate::error::CoreResult;
use crate::query::field::{FieldResolver, FieldValue};
use crate::query::filter::Filter;
use crate::query::sort::Sort;
use crate::registry::{ObjectRegistry, Registry, RegistryObject};
use std::rc::Rc;

/// A keyed snapshot that can be queried and re-seeded.
pub trait Queryable: Sized {
    type Item: FieldResolver + Clone + 'static;

    /// Entries in snapshot order.
    fn entries(&self) -> Vec<(&str, &Self::Item)>;

    /// Independent instance of the same kind holding `items`.
    fn seed_from(&self, items: Vec<(String, Self::Item)>) -> CoreResult<Self>;
}

impl<V: FieldResolver + Clone + 'static> Queryable for Registry<V> {
    type Item = V;

    fn entries(&self) -> Vec<(&str, &V)> {
        self.iter().collect()
    }

    fn seed_from(&self, items: Vec<(String, V)>) -> CoreResult<Self> {
        self.seed(items)
    }
}

impl<T: RegistryObject + FieldResolver + ?Sized + 'static> Queryable for ObjectRegistry<T> {
    type Item = Rc<T>;

    fn entries(&self) -> Vec<(&str, &Rc<T>)> {
        self.iter().collect()
    }

    fn seed_from(&self, items: Vec<(String, Rc<T>)>) -> CoreResult<Self> {
        self.seed(items)
    }
}

/// Query bound to one registry snapshot.
pub struct RegistryQuery<'a, R: Queryable> {
    source: &'a R,
    filter: Filter,
    sort: Sort<R::Item>,
}

impl<'a, R: Queryable> RegistryQuery<'a, R> {
    pub fn new(source: &'a R) -> Self {
        Self {
            source,
            filter: Filter::new(),
            sort: Sort::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: Sort<R::Item>) -> Self {
        self.sort = sort;
        self
    }

    /// First match in snapshot order, ignoring the sort.
    pub fn find(&self) -> Option<R::Item> {
        self.filter.find(self.source)
    }

    /// Filtered and sorted entries with their keys.
    pub fn entries(&self) -> CoreResult<Vec<(String, R::Item)>> {
        let mut entries = self.filter.filter_entries(self.source);
        self.sort.apply_entries(&mut entries)?;
        Ok(entries)
    }

    /// Filtered and sorted items without keys.
    pub fn items(&self) -> CoreResult<Vec<R::Item>> {
        Ok(self.entries()?.into_iter().map(|(_, item)| item).collect())
    }

    /// Results re-seeded into a registry of the source's kind.
    pub fn get_results(&self) -> CoreResult<R> {
        self.source.seed_from(self.entries()?)
    }

    /// Resolved `field` of every result, skipping items that lack it.
    pub fn pluck(&self, field: &str) -> CoreResult<Vec<FieldValue>> {
        Ok(self
            .entries()?
            .iter()
            .filter_map(|(_, item)| item.resolve_field(field))
            .collect())
    }
}

impl<V: FieldResolver + Clone + 'static> Registry<V> {
    pub fn query(&self) -> RegistryQuery<'_, Self> {
        RegistryQuery::new(self)
    }
}

impl<T: RegistryObject + FieldResolver + ?Sized + 'static> ObjectRegistry<T> {
    pub fn query(&self) -> RegistryQuery<'_, Self> {
        RegistryQuery::new(self)
    }
}
