//! Severity-gated event logger.
//!
//! # Responsibility
//! - Own the registry of event types (severity channels).
//! - Record log items on channels that pass the volume gate.
//! - Broadcast every recorded item to attached observers.
//!
//! # Invariants
//! - `log` never fails: unknown channels, a muted logger and channels above
//!   `max_volume` are silent no-ops.
//! - The logger is muted while it broadcasts, so observers that log cannot
//!   recurse into logging.
//! - `MuteGuard` restores the previous mute state on every exit path.

use crate::config::LoggerConfig;
use crate::dependency::ItemId;
use crate::error::CoreResult;
use crate::event::{Observer, Subject};
use crate::logger::event_type::EventType;
use crate::logger::log_item::LogItem;
use crate::logger::severity::Severity;
use crate::query::{Filter, Sort};
use crate::registry::ObjectRegistry;
use log::warn;
use once_cell::unsync::OnceCell;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Event name broadcast after each recorded item.
pub const EVENT_LOGGED: &str = "event_logged";

thread_local! {
    static SHARED_LOGGER: OnceCell<Rc<Logger>> = OnceCell::new();
}

/// Payload handed to `event_logged` observers.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    /// Type name of the channel that recorded the item.
    pub event_type: String,
    pub item: LogItem,
}

pub struct Logger {
    event_types: RefCell<ObjectRegistry<EventType>>,
    subject: Subject<LoggedEvent>,
    muted: Cell<bool>,
    max_volume: u8,
    channel_capacity: Option<usize>,
}

impl Logger {
    /// Logger with the eight default channels registered.
    pub fn new(config: &LoggerConfig) -> Self {
        let logger = Self {
            event_types: RefCell::new(ObjectRegistry::new("event_types")),
            subject: Subject::new("logger"),
            muted: Cell::new(false),
            max_volume: config.max_volume,
            channel_capacity: config.channel_capacity,
        };
        for severity in Severity::ALL {
            if let Err(err) =
                logger.register_event_type(severity.as_str(), EventType::for_severity(severity))
            {
                warn!(
                    "event=register_event_type module=logger status=error type={} error={err}",
                    severity
                );
            }
        }
        logger
    }

    /// Per-thread instance created on first use with default settings.
    ///
    /// Application roots may use this; components should receive their
    /// logger through their constructor instead.
    pub fn shared() -> Rc<Logger> {
        SHARED_LOGGER.with(|cell| {
            Rc::clone(cell.get_or_init(|| Rc::new(Logger::new(&LoggerConfig::default()))))
        })
    }

    pub fn max_volume(&self) -> u8 {
        self.max_volume
    }

    /// Registers a channel under `key`. A channel without its own capacity
    /// gets the configured per-channel capacity.
    pub fn register_event_type(&self, key: &str, event_type: EventType) -> CoreResult<()> {
        let capacity = event_type.capacity().or(self.channel_capacity);
        let event_type = event_type.with_capacity(capacity);
        self.event_types
            .borrow_mut()
            .add_instance(key, Rc::new(event_type))?;
        Ok(())
    }

    /// Resolves a channel by key, then by type name.
    pub fn event_type(&self, type_key: &str) -> Option<Rc<EventType>> {
        let event_types = self.event_types.borrow();
        if let Ok(found) = event_types.get(type_key) {
            return Some(found);
        }
        let by_name = event_types
            .iter()
            .find(|(_, event_type)| event_type.type_name() == type_key)
            .map(|(_, event_type)| Rc::clone(event_type));
        by_name
    }

    /// Records `item` on `type_key` and broadcasts it. Returns whether the
    /// item was recorded.
    pub fn log(&self, type_key: &str, item: LogItem) -> bool {
        if self.is_muted() {
            return false;
        }
        let event_type = match self.event_type(type_key) {
            Some(event_type) => event_type,
            None => return false,
        };
        if event_type.volume() > self.max_volume {
            return false;
        }

        log::log!(
            event_type.level().log_level(),
            "event={} module=logger channel={} message={}",
            item.code(),
            event_type.type_name(),
            item.message()
        );
        event_type.push(item.clone());

        let _mute = self.mute_scope();
        let mut logged = LoggedEvent {
            event_type: event_type.type_name().to_string(),
            item,
        };
        if let Err(err) = self.subject.notify(EVENT_LOGGED, &mut logged) {
            warn!(
                "event=log_broadcast module=logger status=error code={} error={err}",
                err.code()
            );
        }
        true
    }

    pub fn is_muted(&self) -> bool {
        self.muted.get()
    }

    pub fn mute(&self) {
        self.muted.set(true);
    }

    pub fn unmute(&self) {
        self.muted.set(false);
    }

    /// Mutes until the returned guard drops, then restores the prior state.
    pub fn mute_scope(&self) -> MuteGuard<'_> {
        let previous = self.muted.replace(true);
        MuteGuard {
            logger: self,
            previous,
        }
    }

    pub fn emergency(&self, item: impl Into<LogItem>) -> bool {
        self.log(Severity::Emergency.as_str(), item.into())
    }

    pub fn alert(&self, item: impl Into<LogItem>) -> bool {
        self.log(Severity::Alert.as_str(), item.into())
    }

    pub fn critical(&self, item: impl Into<LogItem>) -> bool {
        self.log(Severity::Critical.as_str(), item.into())
    }

    pub fn error(&self, item: impl Into<LogItem>) -> bool {
        self.log(Severity::Error.as_str(), item.into())
    }

    pub fn warning(&self, item: impl Into<LogItem>) -> bool {
        self.log(Severity::Warning.as_str(), item.into())
    }

    pub fn notice(&self, item: impl Into<LogItem>) -> bool {
        self.log(Severity::Notice.as_str(), item.into())
    }

    pub fn info(&self, item: impl Into<LogItem>) -> bool {
        self.log(Severity::Info.as_str(), item.into())
    }

    pub fn debug(&self, item: impl Into<LogItem>) -> bool {
        self.log(Severity::Debug.as_str(), item.into())
    }

    /// Attaches an `event_logged` observer.
    pub fn attach(&self, observer: Rc<dyn Observer<LoggedEvent>>) -> CoreResult<()> {
        self.subject.attach(EVENT_LOGGED, observer)
    }

    pub fn detach(&self, id: &ItemId) -> usize {
        self.subject.detach(EVENT_LOGGED, id)
    }

    pub fn subject(&self) -> &Subject<LoggedEvent> {
        &self.subject
    }

    /// Items recorded on `type_key`, oldest first. Unknown channels are empty.
    pub fn events(&self, type_key: &str) -> Vec<LogItem> {
        self.event_type(type_key)
            .map(|event_type| event_type.events())
            .unwrap_or_default()
    }

    pub fn count(&self, type_key: &str) -> usize {
        self.event_type(type_key).map_or(0, |event_type| event_type.len())
    }

    /// Drops the items of one channel; returns how many were dropped.
    pub fn purge(&self, type_key: &str) -> usize {
        self.event_type(type_key)
            .map_or(0, |event_type| event_type.purge())
    }

    pub fn purge_all(&self) -> usize {
        let event_types = self.event_types.borrow().values();
        event_types.iter().map(|event_type| event_type.purge()).sum()
    }

    /// Keys of the channels in `group`, most severe first.
    pub fn event_types_in_group(&self, group: &str) -> CoreResult<Vec<String>> {
        let event_types = self.event_types.borrow();
        let entries = event_types
            .query()
            .filter(Filter::new().is_in("group", [group]))
            .sort(Sort::new().asc("volume"))
            .entries()?;
        Ok(entries.into_iter().map(|(key, _)| key).collect())
    }

    /// Registered channel keys in registration order.
    pub fn event_type_keys(&self) -> Vec<String> {
        self.event_types
            .borrow()
            .keys()
            .map(str::to_string)
            .collect()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(&LoggerConfig::default())
    }
}

/// Scoped mute; dropping it restores the state captured at creation.
pub struct MuteGuard<'a> {
    logger: &'a Logger,
    previous: bool,
}

impl Drop for MuteGuard<'_> {
    fn drop(&mut self) {
        self.logger.muted.set(self.previous);
    }
}
