//! Dependency-ordered resolution of dependent items.
//!
//! # Responsibility
//! - Order items so every item follows its dependencies.
//! - Break sibling ties by priority.
//! - Exclude, and report, items that can never be placed.
//!
//! # Invariants
//! - Ordering is recomputed from the given snapshot on every call.
//! - Items with unmet (transitive) dependencies are dropped, never raised.
//! - Items stuck in a dependency cycle are dropped once the queue stops
//!   making progress; resolution always terminates.
//! - Zero or one item is returned unchanged.

use crate::dependency::item::{DependentItem, ItemId};
use crate::logger::{LogItem, Logger};
use crate::registry::{ObjectRegistry, RegistryObject};
use log::debug;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

/// Reason an item was excluded from the resolved order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachReason {
    UnmetDependencies,
    CircularDependency,
}

impl DetachReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnmetDependencies => "unmet dependencies",
            Self::CircularDependency => "circular dependency",
        }
    }
}

/// Stateless resolver; optional logger receives detach diagnostics.
#[derive(Clone, Copy, Default)]
pub struct DependencyResolver<'a> {
    logger: Option<&'a Logger>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new() -> Self {
        Self { logger: None }
    }

    pub fn with_logger(logger: &'a Logger) -> Self {
        Self {
            logger: Some(logger),
        }
    }

    /// Resolves the current contents of `registry`.
    pub fn resolve<T>(&self, registry: &ObjectRegistry<T>) -> Vec<Rc<T>>
    where
        T: DependentItem + RegistryObject + ?Sized + 'static,
    {
        self.resolve_items(registry.values())
    }

    /// Resolves `items`, given in snapshot order.
    pub fn resolve_items<T: DependentItem + ?Sized>(&self, items: Vec<Rc<T>>) -> Vec<Rc<T>> {
        if items.len() <= 1 {
            return items;
        }

        let mut by_id: BTreeMap<ItemId, Rc<T>> = BTreeMap::new();
        for item in &items {
            by_id
                .entry(item.id().clone())
                .or_insert_with(|| Rc::clone(item));
        }

        let mut queue: VecDeque<Rc<T>> = items.into();
        let mut result: Vec<Rc<T>> = Vec::with_capacity(queue.len());
        let mut queued_ids: BTreeSet<ItemId> = BTreeSet::new();
        let mut deferred_without_progress = 0usize;

        while let Some(item) = queue.pop_front() {
            let unmet: Vec<ItemId> = transitive_dependencies(&*item, &by_id)
                .into_iter()
                .filter(|id| !by_id.contains_key(id))
                .collect();
            if !unmet.is_empty() {
                self.report(&*item, DetachReason::UnmetDependencies, &unmet);
                deferred_without_progress = 0;
                continue;
            }

            let not_yet_placed: Vec<ItemId> = item
                .dependencies()
                .iter()
                .filter(|id| !queued_ids.contains(*id))
                .cloned()
                .collect();
            if !not_yet_placed.is_empty() {
                queue.push_back(item);
                deferred_without_progress += 1;
                if deferred_without_progress >= queue.len() {
                    for stuck in queue.drain(..) {
                        let waiting: Vec<ItemId> = stuck
                            .dependencies()
                            .iter()
                            .filter(|id| !queued_ids.contains(*id))
                            .cloned()
                            .collect();
                        self.report(&*stuck, DetachReason::CircularDependency, &waiting);
                    }
                }
                continue;
            }

            let index = insertion_index(&*item, &result);
            queued_ids.insert(item.id().clone());
            result.insert(index, item);
            deferred_without_progress = 0;
        }

        result
    }

    fn report<T: DependentItem + ?Sized>(&self, item: &T, reason: DetachReason, ids: &[ItemId]) {
        let names: Vec<String> = ids.iter().map(ToString::to_string).collect();
        match self.logger {
            Some(logger) => {
                logger.log(
                    "debug",
                    LogItem::new("item_detached", format!("item detached: {}", reason.as_str()))
                        .with_data("id", item.id().to_string())
                        .with_data("reason", reason.as_str())
                        .with_data(
                            "dependencies",
                            Value::from(names),
                        ),
                );
            }
            None => debug!(
                "event=item_detached module=dependency id={} reason={} dependencies={}",
                item.id(),
                reason.as_str(),
                names.join(",")
            ),
        }
    }
}

/// Direct dependency ids plus, recursively, those of dependencies that exist.
fn transitive_dependencies<T: DependentItem + ?Sized>(
    item: &T,
    by_id: &BTreeMap<ItemId, Rc<T>>,
) -> Vec<ItemId> {
    let mut visited: BTreeSet<ItemId> = BTreeSet::new();
    let mut ordered = Vec::new();
    let mut pending: Vec<ItemId> = item.dependencies().iter().rev().cloned().collect();

    while let Some(id) = pending.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        if let Some(dependency) = by_id.get(&id) {
            pending.extend(dependency.dependencies().iter().rev().cloned());
        }
        ordered.push(id);
    }
    ordered
}

/// Position right after the last direct dependency, or after the last
/// sibling sharing a dependency with at least this item's priority. With
/// neither, the item goes to the front.
fn insertion_index<T: DependentItem + ?Sized>(item: &T, result: &[Rc<T>]) -> usize {
    let dependencies = item.dependencies();
    let mut insert_at: Option<usize> = None;

    for (index, placed) in result.iter().enumerate() {
        let is_direct = dependencies.contains(placed.id());
        let outranking_sibling = !is_direct
            && placed.priority() >= item.priority()
            && placed
                .dependencies()
                .iter()
                .any(|id| dependencies.contains(id));
        if is_direct || outranking_sibling {
            insert_at = Some(index);
        }
    }

    insert_at.map_or(0, |index| index + 1)
}

#[cfg(test)]
mod tests {
    use super::DependencyResolver;
    use crate::dependency::item::{Identifiable, ItemDependencies};
    use std::rc::Rc;

    fn ids(items: &[Rc<ItemDependencies>]) -> Vec<String> {
        items.iter().map(|item| item.id().to_string()).collect()
    }

    fn item(id: &str, deps: &[&str]) -> Rc<ItemDependencies> {
        let mut item = ItemDependencies::new(id);
        for dep in deps {
            item = item.depends_on(*dep);
        }
        Rc::new(item)
    }

    #[test]
    fn zero_or_one_item_is_returned_unchanged() {
        let resolver = DependencyResolver::new();
        assert!(resolver
            .resolve_items::<ItemDependencies>(vec![])
            .is_empty());
        let lonely = vec![item("a", &["missing"])];
        assert_eq!(ids(&resolver.resolve_items(lonely)), vec!["a"]);
    }

    #[test]
    fn orders_chain_for_every_permutation() {
        let a = item("a", &[]);
        let b = item("b", &["a"]);
        let c = item("c", &["a", "b"]);
        let permutations = [
            [&a, &b, &c],
            [&a, &c, &b],
            [&b, &a, &c],
            [&b, &c, &a],
            [&c, &a, &b],
            [&c, &b, &a],
        ];
        for permutation in permutations {
            let input = permutation.iter().map(|item| Rc::clone(item)).collect();
            let resolved = DependencyResolver::new().resolve_items(input);
            assert_eq!(ids(&resolved), vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn independent_items_are_placed_at_the_front() {
        let resolved =
            DependencyResolver::new().resolve_items(vec![item("x", &[]), item("y", &[])]);
        assert_eq!(ids(&resolved), vec!["y", "x"]);
    }

    #[test]
    fn transitively_unmet_items_are_dropped() {
        let resolved = DependencyResolver::new().resolve_items(vec![
            item("root", &[]),
            item("broken", &["ghost"]),
            item("leaf", &["broken"]),
        ]);
        assert_eq!(ids(&resolved), vec!["root"]);
    }

    #[test]
    fn cycles_are_dropped_and_resolution_terminates() {
        let resolved = DependencyResolver::new().resolve_items(vec![
            item("ok", &[]),
            item("ping", &["pong"]),
            item("pong", &["ping"]),
            item("waiter", &["ping"]),
        ]);
        assert_eq!(ids(&resolved), vec!["ok"]);
    }

    #[test]
    fn higher_priority_siblings_stay_ahead() {
        let base = item("base", &[]);
        let low = Rc::new(ItemDependencies::new("low").depends_on("base").with_priority(1));
        let high = Rc::new(
            ItemDependencies::new("high")
                .depends_on("base")
                .with_priority(20),
        );
        let resolved = DependencyResolver::new().resolve_items(vec![base, low, high]);
        assert_eq!(ids(&resolved), vec!["base", "high", "low"]);
    }

    #[test]
    fn lower_priority_sibling_goes_after_placed_higher_one() {
        let base = item("base", &[]);
        let high = Rc::new(
            ItemDependencies::new("high")
                .depends_on("base")
                .with_priority(20),
        );
        let low = Rc::new(ItemDependencies::new("low").depends_on("base").with_priority(1));
        let resolved = DependencyResolver::new().resolve_items(vec![base, high, low]);
        assert_eq!(ids(&resolved), vec!["base", "high", "low"]);
    }

    #[test]
    fn equal_priority_siblings_keep_attach_order() {
        let resolved = DependencyResolver::new().resolve_items(vec![
            item("base", &[]),
            item("first", &["base"]),
            item("second", &["base"]),
            item("third", &["base"]),
        ]);
        assert_eq!(ids(&resolved), vec!["base", "first", "second", "third"]);
    }

    #[test]
    fn numeric_ids_match_numeric_string_dependencies() {
        let resolved = DependencyResolver::new().resolve_items(vec![
            Rc::new(ItemDependencies::new(1)),
            item("b", &["1"]),
            item("c", &[]),
        ]);
        assert_eq!(ids(&resolved), vec!["c", "1", "b"]);
    }
}
