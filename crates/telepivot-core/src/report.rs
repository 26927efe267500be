//! Immutable, serializable bundle of the four data products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::GroupStatsRow;
use crate::config::ReportConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::pivot::PivotExport;
use crate::record::TelemetryRecord;
use crate::summary::SummaryStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    /// Offset the pivot buckets were labelled in.
    pub utc_offset_hours: i32,
    pub records: Vec<TelemetryRecord>,
    pub pivot: PivotExport,
    pub statistics: Vec<GroupStatsRow>,
    pub summary: SummaryStats,
}

impl Report {
    /// Build a report in one pass over `records`.
    pub fn build(records: Vec<TelemetryRecord>, config: &ReportConfig) -> Result<Self> {
        let dataset = Dataset::from_records(config.clone(), records)?;
        Ok(Self::from_dataset(&dataset))
    }

    pub fn from_dataset(dataset: &Dataset) -> Self {
        let config = dataset.config();
        Self {
            id: Uuid::new_v4(),
            title: config.title.clone(),
            generated_at: Utc::now(),
            utc_offset_hours: config.utc_offset_hours,
            records: dataset.records().to_vec(),
            pivot: dataset.pivot().to_export(),
            statistics: dataset.groups().rows(),
            summary: dataset.summary(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(value: f64) -> TelemetryRecord {
        TelemetryRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            asset_name: "A".to_string(),
            device_name: "D".to_string(),
            target_name: "T1".to_string(),
            key_name: "disp".to_string(),
            value,
        }
    }

    #[test]
    fn empty_report_is_not_an_error() {
        let report = Report::build(Vec::new(), &ReportConfig::default()).unwrap();
        assert!(report.is_empty());
        assert!(report.statistics.is_empty());
        assert!(report.pivot.rows.is_empty());
        assert!(report.summary.is_empty());
    }

    #[test]
    fn bundles_all_products() {
        let report = Report::build(vec![rec(1.0), rec(3.0)], &ReportConfig::default()).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.statistics.len(), 1);
        assert_eq!(report.statistics[0].std_dev, 1.0);
        assert_eq!(report.pivot.rows[0].cells, vec![Some(2.0)]);
        assert_eq!(report.summary.point_count, 2);
        assert_eq!(report.title, "Telemetry report");
        assert_eq!(report.id.get_version_num(), 4);
    }

    #[test]
    fn each_report_gets_a_fresh_id() {
        let config = ReportConfig::default();
        let a = Report::build(vec![rec(1.0)], &config).unwrap();
        let b = Report::build(vec![rec(1.0)], &config).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serializes_to_json() {
        let report = Report::build(vec![rec(1.0)], &ReportConfig::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["statistics"][0]["target_name"], "T1");
        assert_eq!(json["pivot"]["columns"][0]["key_name"], "disp");
        assert_eq!(json["id"], report.id.to_string());
        let back: Report = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
