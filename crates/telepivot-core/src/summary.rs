//! Whole-dataset summary: how much data there is, over what time, and the
//! overall value range.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::GroupStats;
use crate::record::TelemetryRecord;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Summary statistics over every record in a dataset.
///
/// For empty input every count is zero and every optional field is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub point_count: u64,
    pub target_count: usize,
    pub key_count: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub time_span_hours: Option<f64>,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
}

impl SummaryStats {
    pub fn empty() -> Self {
        Self {
            point_count: 0,
            target_count: 0,
            key_count: 0,
            start_time: None,
            end_time: None,
            time_span_hours: None,
            mean: None,
            min: None,
            max: None,
            range: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }
}

impl Default for SummaryStats {
    fn default() -> Self {
        Self::empty()
    }
}

/// Incremental builder for [`SummaryStats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryBuilder {
    targets: BTreeSet<String>,
    keys: BTreeSet<String>,
    values: Option<GroupStats>,
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: &TelemetryRecord) {
        if !self.targets.contains(&record.target_name) {
            self.targets.insert(record.target_name.clone());
        }
        if !self.keys.contains(&record.key_name) {
            self.keys.insert(record.key_name.clone());
        }
        match &mut self.values {
            Some(stats) => stats.push_record(record),
            None => self.values = Some(GroupStats::from_record(record)),
        }
    }

    pub fn merge(&mut self, other: &SummaryBuilder) {
        self.targets.extend(other.targets.iter().cloned());
        self.keys.extend(other.keys.iter().cloned());
        match (&mut self.values, &other.values) {
            (Some(mine), Some(theirs)) => mine.merge(theirs),
            (None, Some(theirs)) => self.values = Some(theirs.clone()),
            (_, None) => {}
        }
    }

    pub fn finish(&self) -> SummaryStats {
        let Some(stats) = &self.values else {
            return SummaryStats::empty();
        };
        let start = stats.first_seen();
        let end = stats.last_seen();
        let span_ms = (end - start).num_milliseconds() as f64;
        SummaryStats {
            point_count: stats.count(),
            target_count: self.targets.len(),
            key_count: self.keys.len(),
            start_time: Some(start),
            end_time: Some(end),
            time_span_hours: Some(span_ms / MILLIS_PER_HOUR),
            mean: Some(stats.mean()),
            min: Some(stats.min()),
            max: Some(stats.max()),
            range: Some(stats.range()),
        }
    }
}

impl<'a> Extend<&'a TelemetryRecord> for SummaryBuilder {
    fn extend<I: IntoIterator<Item = &'a TelemetryRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

pub fn summarize(records: &[TelemetryRecord]) -> SummaryStats {
    let mut builder = SummaryBuilder::new();
    builder.extend(records);
    builder.finish()
}
