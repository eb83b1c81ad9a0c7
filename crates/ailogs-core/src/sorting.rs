//! Sort comparator for usage logs
//!
//! Logs can be ordered by creation time, cost, latency or total token count.
//! Comparisons are purely numeric (timestamps compare as epoch milliseconds),
//! and an unrecognised field name produces a comparator that treats every
//! pair as equal, which leaves a stable sort's input order untouched.
//!
//! # Examples
//!
//! ```
//! use ailogs_core::sorting::{SortDirection, SortDirective};
//!
//! let directive = SortDirective::new("cost", SortDirection::Desc);
//! assert!(directive.resolved_field().is_some());
//!
//! let unknown = SortDirective::new("favourite_colour", SortDirection::Asc);
//! assert!(unknown.resolved_field().is_none());
//! ```

use crate::types::UsageLogRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Fields logs can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    Cost,
    LatencyMs,
    TotalTokens,
}

impl SortField {
    /// Resolve a field name, returning `None` for unsupported names
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "createdAt" | "created_at" | "date" | "time" => Some(Self::CreatedAt),
            "cost" => Some(Self::Cost),
            "latencyMs" | "latency_ms" | "latency" => Some(Self::LatencyMs),
            "totalTokens" | "total_tokens" | "tokens" => Some(Self::TotalTokens),
            _ => None,
        }
    }

    /// Canonical camelCase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Cost => "cost",
            Self::LatencyMs => "latencyMs",
            Self::TotalTokens => "totalTokens",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(format!("Invalid sort direction: {s}")),
        }
    }
}

/// A requested ordering
///
/// The field is kept as the raw name the caller supplied so that unsupported
/// names degrade to a no-op ordering instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortDirective {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn resolved_field(&self) -> Option<SortField> {
        SortField::from_name(&self.field)
    }
}

impl Default for SortDirective {
    /// Newest first
    fn default() -> Self {
        Self::new(SortField::CreatedAt.as_str(), SortDirection::Desc)
    }
}

/// Compare two logs on a field.
///
/// `None` stands for an unsupported field and always yields `Equal`.
pub fn compare(
    a: &UsageLogRecord,
    b: &UsageLogRecord,
    field: Option<SortField>,
    direction: SortDirection,
) -> Ordering {
    let ascending = match field {
        None => return Ordering::Equal,
        Some(SortField::CreatedAt) => a
            .created_at
            .timestamp_millis()
            .cmp(&b.created_at.timestamp_millis()),
        Some(SortField::Cost) => a.cost.total_cmp(&b.cost),
        Some(SortField::LatencyMs) => a.latency_ms.cmp(&b.latency_ms),
        Some(SortField::TotalTokens) => a.total_tokens().cmp(&b.total_tokens()),
    };

    match direction {
        SortDirection::Asc => ascending,
        SortDirection::Desc => ascending.reverse(),
    }
}

/// Compare two logs on a field given by name
pub fn compare_by_name(
    a: &UsageLogRecord,
    b: &UsageLogRecord,
    field: &str,
    direction: SortDirection,
) -> Ordering {
    compare(a, b, SortField::from_name(field), direction)
}

/// Stable in-place sort of logs by a directive
pub fn sort_logs(logs: &mut [UsageLogRecord], directive: &SortDirective) {
    let field = directive.resolved_field();
    if field.is_none() {
        return;
    }
    logs.sort_by(|a, b| compare(a, b, field, directive.direction));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::LogBuilder;

    fn ids(logs: &[UsageLogRecord]) -> Vec<&str> {
        logs.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_sort_by_cost_both_directions() {
        let mut logs = vec![
            LogBuilder::new("a").cost(1.0).build(),
            LogBuilder::new("b").cost(2.5).build(),
            LogBuilder::new("c").cost(0.25).build(),
        ];

        sort_logs(&mut logs, &SortDirective::new("cost", SortDirection::Asc));
        assert_eq!(ids(&logs), vec!["c", "a", "b"]);

        sort_logs(&mut logs, &SortDirective::new("cost", SortDirection::Desc));
        assert_eq!(ids(&logs), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_sort_by_created_at() {
        let mut logs = vec![
            LogBuilder::new("late").at(2024, 1, 3, 0).build(),
            LogBuilder::new("early").at(2024, 1, 1, 0).build(),
            LogBuilder::new("mid").at(2024, 1, 2, 0).build(),
        ];
        sort_logs(&mut logs, &SortDirective::default());
        assert_eq!(ids(&logs), vec!["late", "mid", "early"]);
    }

    #[test]
    fn test_unsupported_field_is_noop() {
        let mut logs = vec![
            LogBuilder::new("x").cost(3.0).build(),
            LogBuilder::new("y").cost(1.0).build(),
        ];
        sort_logs(&mut logs, &SortDirective::new("prompt", SortDirection::Asc));
        assert_eq!(ids(&logs), vec!["x", "y"]);
        assert_eq!(
            compare_by_name(&logs[0], &logs[1], "prompt", SortDirection::Asc),
            Ordering::Equal
        );
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let mut logs = vec![
            LogBuilder::new("first").latency(100).build(),
            LogBuilder::new("second").latency(50).build(),
            LogBuilder::new("third").latency(100).build(),
        ];
        let directive = SortDirective::new("latency", SortDirection::Desc);
        sort_logs(&mut logs, &directive);
        assert_eq!(ids(&logs), vec!["first", "third", "second"]);
        sort_logs(&mut logs, &directive);
        assert_eq!(ids(&logs), vec!["first", "third", "second"]);
    }

    #[test]
    fn test_compare_is_reflexive_and_antisymmetric() {
        let a = LogBuilder::new("a").tokens(10, 5).build();
        let b = LogBuilder::new("b").tokens(20, 5).build();
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let field = Some(SortField::TotalTokens);
            assert_eq!(compare(&a, &a, field, direction), Ordering::Equal);
            assert_eq!(
                compare(&a, &b, field, direction),
                compare(&b, &a, field, direction).reverse()
            );
        }
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("descending".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("up".parse::<SortDirection>().is_err());
    }
}
