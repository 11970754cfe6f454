//! Per-event observer dispatch.
//!
//! # Responsibility
//! - Keep one observer registry per event name, created on first `attach`.
//! - Broadcast to observers in dependency-resolved order.
//!
//! # Invariants
//! - Observers are keyed by their own id; attaching a duplicate id fails.
//! - `notify` works on a snapshot, so observers may attach or detach on the
//!   same subject while a broadcast is running.
//! - The first observer error stops the broadcast and is returned.
//! - Per-event registries share the subject's logger.

use crate::dependency::{DependencyResolver, Identifiable, ItemId};
use crate::error::CoreResult;
use crate::event::accumulator::Accumulator;
use crate::event::observer::Observer;
use crate::logger::{LogItem, Logger};
use crate::registry::{ObjectRegistry, Registry};
use log::info;
use std::cell::RefCell;
use std::rc::Rc;

type ObserverRegistry<D> = ObjectRegistry<dyn Observer<D>>;

/// Publisher of named events.
pub struct Subject<D: ?Sized + 'static> {
    name: String,
    events: RefCell<Registry<ObserverRegistry<D>>>,
    logger: Option<Rc<Logger>>,
}

impl<D: ?Sized + 'static> Subject<D> {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            events: RefCell::new(Registry::new(format!("{name}.events"))),
            name,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Rc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `observer` to `event`, creating the event's registry if needed.
    pub fn attach(&self, event: &str, observer: Rc<dyn Observer<D>>) -> CoreResult<()> {
        let key = observer.id().to_string();
        {
            let mut events = self.events.borrow_mut();
            if !events.is_registered(event) {
                let mut observers = ObjectRegistry::new(format!("{}.{event}", self.name));
                observers.set_logger(self.logger.clone());
                events.add(event, observers)?;
            }
            events.get_mut(event)?.add_instance(key.clone(), observer)?;
        }
        self.report("observer_attached", "observer attached", event, &key);
        Ok(())
    }

    /// Removes every observer of `event` whose id is `id`. Returns how many
    /// were removed.
    pub fn detach(&self, event: &str, id: &ItemId) -> usize {
        let removed = {
            let mut events = self.events.borrow_mut();
            let observers = match events.get_mut(event) {
                Ok(observers) => observers,
                Err(_) => return 0,
            };
            let matching: Vec<String> = observers
                .iter()
                .filter(|(_, observer)| observer.id() == id)
                .map(|(key, _)| key.to_string())
                .collect();
            for key in &matching {
                observers.remove(key);
            }
            matching.len()
        };
        if removed > 0 {
            self.report("observer_detached", "observer detached", event, &id.to_string());
        }
        removed
    }

    /// Attached observers of `event`, in attach order.
    pub fn observers(&self, event: &str) -> Vec<Rc<dyn Observer<D>>> {
        self.snapshot(event)
            .map(|observers| observers.values())
            .unwrap_or_default()
    }

    pub fn has_observers(&self, event: &str) -> bool {
        self.snapshot(event)
            .map_or(false, |observers| !observers.is_empty())
    }

    /// Event names that have had at least one observer attached.
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().map(|key, _| key.to_string())
    }

    /// Invokes every observer of `event` with `data`, dependencies first.
    pub fn notify(&self, event: &str, data: &mut D) -> CoreResult<()> {
        let observers = match self.snapshot(event) {
            Some(observers) if !observers.is_empty() => observers,
            _ => return Ok(()),
        };
        let resolver = match &self.logger {
            Some(logger) => DependencyResolver::with_logger(logger),
            None => DependencyResolver::new(),
        };
        for observer in resolver.resolve(&observers) {
            observer.update(self, data)?;
        }
        Ok(())
    }

    fn snapshot(&self, event: &str) -> Option<ObserverRegistry<D>> {
        self.events.borrow().get(event).ok().cloned()
    }

    fn report(&self, code: &str, message: &str, event: &str, observer: &str) {
        match &self.logger {
            Some(logger) => {
                logger.log(
                    "info",
                    LogItem::new(code, message)
                        .with_data("subject", self.name.as_str())
                        .with_data("event", event)
                        .with_data("observer", observer),
                );
            }
            None => info!(
                "event={code} module=event subject={} name={event} observer={observer}",
                self.name
            ),
        }
    }
}

impl<S: 'static> Subject<Accumulator<S>> {
    /// Threads `accumulator` through the observers of `event` and returns
    /// its final state.
    pub fn reduce(&self, event: &str, mut accumulator: Accumulator<S>) -> CoreResult<S> {
        self.notify(event, &mut accumulator)?;
        Ok(accumulator.into_state())
    }
}
