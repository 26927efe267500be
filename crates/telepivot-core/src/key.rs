//! Grouping key: the `(target, metric)` pair every statistic is bucketed by.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::TelemetryRecord;

/// Identifies one aggregation bucket.
///
/// Kept as a tuple of owned names rather than a joined string, so a target
/// or metric that contains the display separator cannot alias another group.
/// Ordering is by target name, then metric name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub target_name: String,
    pub key_name: String,
}

impl GroupKey {
    pub fn new(target_name: impl Into<String>, key_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            key_name: key_name.into(),
        }
    }

    pub fn of(record: &TelemetryRecord) -> Self {
        Self::new(record.target_name.as_str(), record.key_name.as_str())
    }

    /// Display label, e.g. `T1-disp` with separator `-`.
    pub fn label(&self, separator: &str) -> String {
        format!("{}{separator}{}", self.target_name, self.key_name)
    }

    pub fn matches(&self, record: &TelemetryRecord) -> bool {
        self.target_name == record.target_name && self.key_name == record.key_name
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.target_name, self.key_name)
    }
}
