//! Filter operators and sort directions used by clause keys.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Operator suffix of a `field__operator` filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    In,
    NotIn,
    And,
    Equals,
}

impl FilterOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::And => "and",
            Self::Equals => "equals",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in" => Some(Self::In),
            "not_in" => Some(Self::NotIn),
            "and" => Some(Self::And),
            "equals" => Some(Self::Equals),
            _ => None,
        }
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction suffix of a `field__direction` sort clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Applies the direction to a natural ordering.
    pub fn apply(self, natural: Ordering) -> Ordering {
        match self {
            Self::Asc => natural,
            Self::Desc => natural.reverse(),
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
