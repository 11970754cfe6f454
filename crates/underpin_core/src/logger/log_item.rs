//! Immutable log records.

use crate::error::CoreError;
use crate::logger::event_type::EventType;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;

/// One recorded occurrence. Builders consume the item; once handed to a
/// logger its content never changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogItem {
    code: String,
    message: String,
    data: BTreeMap<String, Value>,
    reference: Option<String>,
    context: Option<String>,
    created_at: DateTime<Utc>,
}

impl LogItem {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: BTreeMap::new(),
            reference: None,
            context: None,
            created_at: Utc::now(),
        }
    }

    /// Record describing `err` and its source chain.
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        let mut item = Self::new("error", err.to_string());
        let mut sources = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            sources.push(Value::from(cause.to_string()));
            source = cause.source();
        }
        if !sources.is_empty() {
            item = item.with_data("sources", sources);
        }
        item
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// One-line rendering against the channel that holds this item.
    pub fn format(&self, event_type: &EventType) -> String {
        let mut line = format!(
            "[{}] {}.{}: {} {}",
            self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            event_type.type_name().to_ascii_uppercase(),
            event_type.group(),
            self.code,
            self.message
        );
        if let Some(reference) = &self.reference {
            line.push_str(&format!(" ref={reference}"));
        }
        if let Some(context) = &self.context {
            line.push_str(&format!(" context={context}"));
        }
        if !self.data.is_empty() {
            if let Ok(data) = serde_json::to_string(&self.data) {
                line.push(' ');
                line.push_str(&data);
            }
        }
        line
    }
}

impl From<&CoreError> for LogItem {
    fn from(err: &CoreError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<CoreError> for LogItem {
    fn from(err: CoreError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::LogItem;
    use crate::error::CoreError;
    use crate::logger::event_type::EventType;
    use crate::logger::severity::Severity;
    use serde_json::json;
    use std::fmt::{Display, Formatter};

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl Display for Outer {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str("request failed")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn formats_against_its_channel() {
        let item = LogItem::new("cache_miss", "cache missed")
            .with_data("key", "home")
            .with_reference("req-1");
        let line = item.format(&EventType::for_severity(Severity::Warning));
        assert!(line.contains("WARNING.warning: cache_miss cache missed"));
        assert!(line.contains("ref=req-1"));
        assert!(line.ends_with(r#"{"key":"home"}"#));
    }

    #[test]
    fn errors_convert_with_code_and_sources() {
        let item = LogItem::from(CoreError::UnknownRegistryItem {
            registry: "menus".to_string(),
            key: "main".to_string(),
        });
        assert_eq!(item.code(), "unknown_registry_item");
        assert!(item.message().contains("main"));

        let outer = Outer(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let item = LogItem::from_error(&outer);
        assert_eq!(item.message(), "request failed");
        assert_eq!(item.data()["sources"], json!(["disk full"]));
    }
}
