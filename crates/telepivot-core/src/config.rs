//! Report configuration.
//!
//! Controls how timestamps are bucketed for the pivot table and how numbers
//! are presented at the export boundary. The core itself never rounds; the
//! `decimals` setting is read by renderers.

use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default pivot bucket: the timestamp to second precision.
pub const DEFAULT_BUCKET_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Heading used by rendered reports.
    pub title: String,
    /// Wall-clock offset applied to bucket labels and displayed times.
    pub utc_offset_hours: i32,
    /// chrono `strftime` pattern for pivot time buckets.
    pub bucket_format: String,
    /// Separator between target and metric in column labels.
    pub key_separator: String,
    /// Decimal places used when rendering values.
    pub decimals: usize,
    /// While streaming, emit a partial summary every this many records.
    pub stream_refresh_every: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Telemetry report".to_string(),
            utc_offset_hours: 0,
            bucket_format: DEFAULT_BUCKET_FORMAT.to_string(),
            key_separator: "-".to_string(),
            decimals: 3,
            stream_refresh_every: 100,
        }
    }
}

impl ReportConfig {
    /// Load and validate a JSON config file. Missing fields take defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.offset()?;
        if self.bucket_format.trim().is_empty() {
            return Err(Error::Config("bucket_format must not be empty".to_string()));
        }
        if StrftimeItems::new(&self.bucket_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::Config(format!(
                "bucket_format {:?} is not a valid strftime pattern",
                self.bucket_format
            )));
        }
        if self.decimals > 12 {
            return Err(Error::Config(format!(
                "decimals must be at most 12, got {}",
                self.decimals
            )));
        }
        if self.stream_refresh_every == 0 {
            return Err(Error::Config(
                "stream_refresh_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(Error::Config(format!(
                "utc_offset_hours must be within -23..=23, got {}",
                self.utc_offset_hours
            )));
        }
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            Error::Config(format!("invalid UTC offset {}h", self.utc_offset_hours))
        })
    }

    pub fn bucket_formatter(&self) -> Result<BucketFormatter> {
        self.validate()?;
        Ok(BucketFormatter {
            offset: self.offset()?,
            format: self.bucket_format.clone(),
        })
    }
}

/// Formats instants into pivot time-bucket labels.
///
/// Only constructed through [`ReportConfig::bucket_formatter`], which has
/// already checked the pattern, so formatting cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketFormatter {
    offset: FixedOffset,
    format: String,
}

impl BucketFormatter {
    pub fn format(&self, timestamp: &DateTime<Utc>) -> String {
        timestamp
            .with_timezone(&self.offset)
            .format(&self.format)
            .to_string()
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for BucketFormatter {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            format: DEFAULT_BUCKET_FORMAT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_config_is_valid() {
        let config = ReportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.decimals, 3);
        assert_eq!(config.bucket_format, DEFAULT_BUCKET_FORMAT);
    }

    #[test]
    fn default_formatter_buckets_to_the_second() {
        let f = ReportConfig::default().bucket_formatter().unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::milliseconds(750);
        assert_eq!(f.format(&ts), "2024-01-01 00:00:00");
        assert_eq!(f, BucketFormatter::default());
    }

    #[test]
    fn offset_shifts_bucket_labels() {
        let config = ReportConfig {
            utc_offset_hours: 8,
            ..Default::default()
        };
        let f = config.bucket_formatter().unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(f.format(&ts), "2024-01-02 04:00:00");
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let config = ReportConfig {
            utc_offset_hours: 30,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_bad_patterns_and_limits() {
        let bad_format = ReportConfig {
            bucket_format: "%Q".to_string(),
            ..Default::default()
        };
        assert!(bad_format.validate().is_err());

        let empty_format = ReportConfig {
            bucket_format: "  ".to_string(),
            ..Default::default()
        };
        assert!(empty_format.validate().is_err());

        let zero_refresh = ReportConfig {
            stream_refresh_every: 0,
            ..Default::default()
        };
        assert!(zero_refresh.validate().is_err());

        let too_precise = ReportConfig {
            decimals: 40,
            ..Default::default()
        };
        assert!(too_precise.validate().is_err());
    }

    #[test]
    fn loads_partial_json_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.json");
        std::fs::write(&path, r#"{"utc_offset_hours": 8, "decimals": 2}"#).unwrap();

        let config = ReportConfig::load_from_path(&path).unwrap();
        assert_eq!(config.utc_offset_hours, 8);
        assert_eq!(config.decimals, 2);
        assert_eq!(config.key_separator, "-");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ReportConfig::load_from_path(Path::new("/nonexistent/telepivot.json"));
        assert!(matches!(err, Err(Error::Io(_))));
    }
}
