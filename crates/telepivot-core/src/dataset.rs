//! Application state for one loaded (or still loading) set of records.
//!
//! A [`Dataset`] keeps the raw records alongside the three derived products
//! and updates all of them on every [`push`](Dataset::push), so callers can
//! read statistics, the pivot table or the summary at any point while a
//! stream is arriving without recomputing from scratch.

use crate::aggregate::GroupedStats;
use crate::config::{BucketFormatter, ReportConfig};
use crate::error::Result;
use crate::pivot::PivotTable;
use crate::record::{TelemetryRecord, validate_records};
use crate::report::Report;
use crate::summary::{SummaryBuilder, SummaryStats};

#[derive(Debug, Clone)]
pub struct Dataset {
    config: ReportConfig,
    formatter: BucketFormatter,
    records: Vec<TelemetryRecord>,
    groups: GroupedStats,
    pivot: PivotTable,
    summary: SummaryBuilder,
}

impl Dataset {
    /// Create an empty dataset. Fails if `config` does not validate.
    pub fn new(config: ReportConfig) -> Result<Self> {
        let formatter = config.bucket_formatter()?;
        Ok(Self {
            config,
            formatter,
            records: Vec::new(),
            groups: GroupedStats::new(),
            pivot: PivotTable::new(),
            summary: SummaryBuilder::new(),
        })
    }

    /// Build a dataset from already-typed records, checking each one first.
    pub fn from_records(config: ReportConfig, records: Vec<TelemetryRecord>) -> Result<Self> {
        validate_records(&records)?;
        let mut dataset = Self::new(config)?;
        dataset.extend(records);
        Ok(dataset)
    }

    pub fn push(&mut self, record: TelemetryRecord) {
        self.groups.push(&record);
        self.pivot.push(&record, |ts| self.formatter.format(ts));
        self.summary.push(&record);
        self.records.push(record);
    }

    pub fn extend<I: IntoIterator<Item = TelemetryRecord>>(&mut self, records: I) {
        let before = self.records.len();
        for record in records {
            self.push(record);
        }
        log::debug!(
            "dataset grew by {} records to {}",
            self.records.len() - before,
            self.records.len()
        );
    }

    /// Fold another dataset into this one.
    ///
    /// When both were built with the same bucket formatter the pivot tables
    /// merge directly; otherwise the other side's records are re-bucketed
    /// with this dataset's formatter.
    pub fn merge(&mut self, other: &Dataset) {
        self.groups.merge(&other.groups);
        self.summary.merge(&other.summary);
        if self.formatter == other.formatter {
            self.pivot.merge(&other.pivot);
        } else {
            for record in &other.records {
                self.pivot.push(record, |ts| self.formatter.format(ts));
            }
        }
        self.records.extend(other.records.iter().cloned());
        log::debug!(
            "merged {} records, dataset now holds {}",
            other.records.len(),
            self.records.len()
        );
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn formatter(&self) -> &BucketFormatter {
        &self.formatter
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        &self.records
    }

    pub fn groups(&self) -> &GroupedStats {
        &self.groups
    }

    pub fn pivot(&self) -> &PivotTable {
        &self.pivot
    }

    pub fn summary(&self) -> SummaryStats {
        self.summary.finish()
    }

    /// Snapshot the current state as a report.
    pub fn report(&self) -> Report {
        Report::from_dataset(self)
    }
}
