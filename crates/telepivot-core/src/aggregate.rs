//! Per-group running statistics.
//!
//! Each `(target, metric)` group owns a [`GroupStats`] accumulator holding
//! the count, the sum, the sum of squared deviations from the running mean
//! (Welford) and the extrema. Mean, population standard deviation and range
//! are derived when read. Two accumulators for the same group merge with the
//! pairwise update of Chan et al., so partial results from separate batches
//! combine into the single-pass answer up to rounding.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::GroupKey;
use crate::record::TelemetryRecord;

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Running statistics for one group. Never empty: it is created from the
/// first value it sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    count: u64,
    sum: f64,
    m2: f64,
    min: f64,
    max: f64,
    min_time: DateTime<Utc>,
    max_time: DateTime<Utc>,
}

impl GroupStats {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            sum: value,
            m2: 0.0,
            min: value,
            max: value,
            min_time: timestamp,
            max_time: timestamp,
        }
    }

    pub fn from_record(record: &TelemetryRecord) -> Self {
        Self::new(record.value, record.timestamp)
    }

    pub fn push(&mut self, value: f64, timestamp: DateTime<Utc>) {
        let delta = value - self.mean();
        self.count += 1;
        self.sum += value;
        self.m2 += delta * (value - self.mean());
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        if timestamp < self.min_time {
            self.min_time = timestamp;
        }
        if timestamp > self.max_time {
            self.max_time = timestamp;
        }
    }

    pub fn push_record(&mut self, record: &TelemetryRecord) {
        self.push(record.value, record.timestamp);
    }

    /// Fold another accumulator of the same group into this one.
    pub fn merge(&mut self, other: &GroupStats) {
        let delta = other.mean() - self.mean();
        let (n_a, n_b) = (self.count as f64, other.count as f64);
        self.m2 += other.m2 + delta * delta * n_a * n_b / (n_a + n_b);
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        if other.min_time < self.min_time {
            self.min_time = other.min_time;
        }
        if other.max_time > self.max_time {
            self.max_time = other.max_time;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Earliest timestamp seen.
    pub fn first_seen(&self) -> DateTime<Utc> {
        self.min_time
    }

    /// Latest timestamp seen.
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.max_time
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// Population variance, `mean((x - mean)²)`.
    pub fn variance(&self) -> f64 {
        (self.m2 / self.count as f64).max(0.0)
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

// ---------------------------------------------------------------------------
// Grouped statistics
// ---------------------------------------------------------------------------

/// Flat, serializable readout of one group's statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatsRow {
    pub target_name: String,
    pub key_name: String,
    pub count: u64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub range: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl GroupStatsRow {
    fn new(key: &GroupKey, stats: &GroupStats) -> Self {
        Self {
            target_name: key.target_name.clone(),
            key_name: key.key_name.clone(),
            count: stats.count(),
            mean: stats.mean(),
            min: stats.min(),
            max: stats.max(),
            std_dev: stats.std_dev(),
            range: stats.range(),
            first_seen: stats.first_seen(),
            last_seen: stats.last_seen(),
        }
    }
}

/// Accumulators for every group seen so far, ordered by [`GroupKey`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedStats {
    groups: BTreeMap<GroupKey, GroupStats>,
}

impl GroupedStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into its group, creating the group on first sight.
    pub fn push(&mut self, record: &TelemetryRecord) {
        match self.groups.entry(GroupKey::of(record)) {
            Entry::Occupied(mut e) => e.get_mut().push_record(record),
            Entry::Vacant(e) => {
                e.insert(GroupStats::from_record(record));
            }
        }
    }

    pub fn merge(&mut self, other: &GroupedStats) {
        for (key, stats) in &other.groups {
            match self.groups.get_mut(key) {
                Some(existing) => existing.merge(stats),
                None => {
                    self.groups.insert(key.clone(), stats.clone());
                }
            }
        }
    }

    pub fn get(&self, key: &GroupKey) -> Option<&GroupStats> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &GroupStats)> {
        self.groups.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Readout of every group in key order.
    pub fn rows(&self) -> Vec<GroupStatsRow> {
        self.groups
            .iter()
            .map(|(key, stats)| GroupStatsRow::new(key, stats))
            .collect()
    }
}

impl<'a> Extend<&'a TelemetryRecord> for GroupedStats {
    fn extend<I: IntoIterator<Item = &'a TelemetryRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

/// Aggregate a batch of records into per-group statistics.
///
/// Empty input yields an empty mapping.
pub fn aggregate(records: &[TelemetryRecord]) -> GroupedStats {
    let mut grouped = GroupedStats::new();
    grouped.extend(records);
    grouped
}
