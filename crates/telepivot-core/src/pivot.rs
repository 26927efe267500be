//! Wide-format pivot table: time buckets as rows, group keys as columns.
//!
//! Storage is sparse (bucket → key → cell) so a table with many targets that
//! report at different instants does not materialise a mostly-empty matrix
//! until [`PivotTable::to_export`] is asked for one.
//!
//! A cell keeps the count and sum of every value that landed in it; its
//! reading is their arithmetic mean, so three or more colliding values
//! produce the same result regardless of arrival order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::GroupKey;
use crate::record::TelemetryRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Cell {
    count: u64,
    sum: f64,
}

impl Cell {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    fn merge(&mut self, other: Cell) {
        self.count += other.count;
        self.sum += other.sum;
    }

    fn mean(self) -> f64 {
        self.sum / self.count as f64
    }
}

/// One row of the pivot table. Keys absent from `columns` have no
/// measurement in this bucket (which is distinct from a measured zero).
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub time_bucket: String,
    pub columns: BTreeMap<GroupKey, f64>,
}

/// Dense form for spreadsheet-style consumers: one `cells` entry per
/// column, `None` where nothing was measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotExport {
    pub columns: Vec<GroupKey>,
    pub rows: Vec<PivotExportRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotExportRow {
    pub time_bucket: String,
    pub cells: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    columns: BTreeSet<GroupKey>,
    rows: BTreeMap<String, BTreeMap<GroupKey, Cell>>,
}

impl PivotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record, bucketing its timestamp with `formatter`.
    pub fn push<F>(&mut self, record: &TelemetryRecord, formatter: F)
    where
        F: Fn(&DateTime<Utc>) -> String,
    {
        self.insert(
            formatter(&record.timestamp),
            GroupKey::of(record),
            record.value,
        );
    }

    pub fn insert(&mut self, time_bucket: String, key: GroupKey, value: f64) {
        if !self.columns.contains(&key) {
            self.columns.insert(key.clone());
        }
        self.rows
            .entry(time_bucket)
            .or_default()
            .entry(key)
            .or_default()
            .push(value);
    }

    /// Fold in a table built with the same bucket formatter.
    pub fn merge(&mut self, other: &PivotTable) {
        self.columns.extend(other.columns.iter().cloned());
        for (bucket, cells) in &other.rows {
            let row = self.rows.entry(bucket.clone()).or_default();
            for (key, cell) in cells {
                row.entry(key.clone()).or_default().merge(*cell);
            }
        }
    }

    /// Sorted column keys.
    pub fn columns(&self) -> impl Iterator<Item = &GroupKey> {
        self.columns.iter()
    }

    /// Sorted time bucket labels.
    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, time_bucket: &str, key: &GroupKey) -> Option<f64> {
        self.rows
            .get(time_bucket)
            .and_then(|row| row.get(key))
            .map(|cell| cell.mean())
    }

    /// Number of values averaged into a cell (0 when empty).
    pub fn cell_count(&self, time_bucket: &str, key: &GroupKey) -> u64 {
        self.rows
            .get(time_bucket)
            .and_then(|row| row.get(key))
            .map_or(0, |cell| cell.count)
    }

    pub fn rows(&self) -> impl Iterator<Item = PivotRow> + '_ {
        self.rows.iter().map(|(bucket, cells)| PivotRow {
            time_bucket: bucket.clone(),
            columns: cells
                .iter()
                .map(|(key, cell)| (key.clone(), cell.mean()))
                .collect(),
        })
    }

    pub fn to_export(&self) -> PivotExport {
        let columns: Vec<GroupKey> = self.columns.iter().cloned().collect();
        let rows = self
            .rows
            .iter()
            .map(|(bucket, cells)| PivotExportRow {
                time_bucket: bucket.clone(),
                cells: columns
                    .iter()
                    .map(|key| cells.get(key).map(|cell| cell.mean()))
                    .collect(),
            })
            .collect();
        PivotExport { columns, rows }
    }
}

/// Reshape records into a pivot table.
pub fn pivot<F>(records: &[TelemetryRecord], formatter: F) -> PivotTable
where
    F: Fn(&DateTime<Utc>) -> String,
{
    let mut table = PivotTable::new();
    for record in records {
        table.push(record, &formatter);
    }
    table
}
