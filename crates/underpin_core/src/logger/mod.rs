//! Severity logger: channels, records and the logger itself.

pub mod event_type;
pub mod log_item;
pub mod severity;
pub mod severity_logger;

pub use event_type::EventType;
pub use log_item::LogItem;
pub use severity::Severity;
pub use severity_logger::{LoggedEvent, Logger, MuteGuard, EVENT_LOGGED};
