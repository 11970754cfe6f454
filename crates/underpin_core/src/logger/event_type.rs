//! Severity channels with a bounded in-memory log.

use crate::logger::log_item::LogItem;
use crate::logger::severity::Severity;
use crate::query::field::{FieldResolver, FieldValue};
use crate::registry::RegistryObject;
use std::cell::RefCell;
use std::collections::VecDeque;

/// One logging channel.
///
/// # Invariants
/// - Items are kept in append order; when a capacity is set the oldest item
///   is evicted first.
#[derive(Debug)]
pub struct EventType {
    type_name: String,
    volume: u8,
    group: String,
    level: Severity,
    capacity: Option<usize>,
    items: RefCell<VecDeque<LogItem>>,
}

impl EventType {
    pub fn new(
        type_name: impl Into<String>,
        volume: u8,
        group: impl Into<String>,
        level: Severity,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            volume,
            group: group.into(),
            level,
            capacity: None,
            items: RefCell::new(VecDeque::new()),
        }
    }

    /// Default channel for `severity`.
    pub fn for_severity(severity: Severity) -> Self {
        Self::new(
            severity.as_str(),
            severity.volume(),
            severity.group(),
            severity,
        )
    }

    pub fn with_capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub(crate) fn push(&self, item: LogItem) {
        let mut items = self.items.borrow_mut();
        if let Some(capacity) = self.capacity {
            while items.len() >= capacity.max(1) {
                items.pop_front();
            }
        }
        items.push_back(item);
    }

    /// Logged items, oldest first.
    pub fn events(&self) -> Vec<LogItem> {
        self.items.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Drops every logged item; returns how many were dropped.
    pub fn purge(&self) -> usize {
        let mut items = self.items.borrow_mut();
        let purged = items.len();
        items.clear();
        purged
    }

    pub fn format(&self, item: &LogItem) -> String {
        item.format(self)
    }
}

impl RegistryObject for EventType {}

impl FieldResolver for EventType {
    fn resolve_field(&self, field: &str) -> Option<FieldValue> {
        match field {
            "type" | "type_name" => Some(FieldValue::from(self.type_name.as_str())),
            "volume" => Some(FieldValue::from(self.volume)),
            "group" => Some(FieldValue::from(self.group.as_str())),
            "level" => Some(FieldValue::from(self.level.as_str())),
            "count" => Some(FieldValue::Count(self.len())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EventType;
    use crate::logger::log_item::LogItem;
    use crate::logger::severity::Severity;

    #[test]
    fn capacity_evicts_oldest_first() {
        let channel = EventType::for_severity(Severity::Info).with_capacity(Some(2));
        for code in ["one", "two", "three"] {
            channel.push(LogItem::new(code, "message"));
        }
        let codes: Vec<String> = channel
            .events()
            .iter()
            .map(|item| item.code().to_string())
            .collect();
        assert_eq!(codes, vec!["two", "three"]);
        assert_eq!(channel.purge(), 2);
        assert!(channel.is_empty());
    }
}
