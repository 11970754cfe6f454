//! The eight default severity channels.

use std::fmt::{Display, Formatter};

/// Diagnostic level of an event type, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    pub const ALL: [Severity; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str() == value)
    }

    /// Default channel volume; lower is more severe.
    pub fn volume(self) -> u8 {
        self as u8 + 1
    }

    /// Default channel group.
    pub fn group(self) -> &'static str {
        match self {
            Self::Emergency | Self::Alert | Self::Critical | Self::Error => "error",
            Self::Warning | Self::Notice => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// `log` facade level used when mirroring records.
    pub fn log_level(self) -> log::Level {
        match self {
            Self::Emergency | Self::Alert | Self::Critical | Self::Error => log::Level::Error,
            Self::Warning => log::Level::Warn,
            Self::Notice | Self::Info => log::Level::Info,
            Self::Debug => log::Level::Debug,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
