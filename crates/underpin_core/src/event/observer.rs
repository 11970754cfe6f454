//! Observer contract and a closure-backed implementation.

use crate::dependency::{DependentItem, Identifiable, ItemDependencies, ItemId};
use crate::error::CoreResult;
use crate::event::subject::Subject;
use crate::registry::RegistryObject;
use std::rc::Rc;

/// Dependency-aware unit of work invoked when a subject broadcasts.
///
/// An `Err` stops the remaining observers of that broadcast and is returned
/// to whoever called `notify`.
pub trait Observer<D: ?Sized + 'static>: DependentItem + RegistryObject {
    fn update(&self, subject: &Subject<D>, data: &mut D) -> CoreResult<()>;
}

type ObserverCallback<D> = Box<dyn Fn(&Subject<D>, &mut D) -> CoreResult<()>>;

/// Observer whose work is a closure.
pub struct CallbackObserver<D: ?Sized + 'static> {
    dependencies: ItemDependencies,
    callback: ObserverCallback<D>,
}

impl<D: ?Sized + 'static> CallbackObserver<D> {
    pub fn new(
        id: impl Into<ItemId>,
        callback: impl Fn(&Subject<D>, &mut D) -> CoreResult<()> + 'static,
    ) -> Self {
        Self {
            dependencies: ItemDependencies::new(id),
            callback: Box::new(callback),
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.dependencies.priority = priority;
        self
    }

    pub fn depends_on(mut self, id: impl Into<ItemId>) -> Self {
        self.dependencies.add_dependency(id.into());
        self
    }

    pub fn into_observer(self) -> Rc<dyn Observer<D>> {
        Rc::new(self)
    }
}

impl<D: ?Sized + 'static> Identifiable for CallbackObserver<D> {
    fn id(&self) -> &ItemId {
        self.dependencies.id()
    }
}

impl<D: ?Sized + 'static> DependentItem for CallbackObserver<D> {
    fn priority(&self) -> i64 {
        self.dependencies.priority()
    }

    fn dependencies(&self) -> &[ItemId] {
        self.dependencies.dependencies()
    }

    fn add_dependency(&mut self, id: ItemId) {
        self.dependencies.add_dependency(id);
    }

    fn remove_dependency(&mut self, id: &ItemId) {
        self.dependencies.remove_dependency(id);
    }
}

impl<D: ?Sized + 'static> RegistryObject for CallbackObserver<D> {}

impl<D: ?Sized + 'static> Observer<D> for CallbackObserver<D> {
    fn update(&self, subject: &Subject<D>, data: &mut D) -> CoreResult<()> {
        (self.callback)(subject, data)
    }
}
