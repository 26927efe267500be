pub mod export;
pub mod pivot;
pub mod server;
pub mod stats;
pub mod stream;
pub mod summary;

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use telepivot_core::{Dataset, ReportConfig, load_records};

/// Display format for timestamps in tables and sheets.
pub const DISPLAY_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Command-line settings that take precedence over the config file.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub title: Option<String>,
    pub utc_offset_hours: Option<i32>,
    pub decimals: Option<usize>,
    pub bucket_format: Option<String>,
    pub stream_refresh_every: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut ReportConfig) {
        if let Some(title) = self.title {
            config.title = title;
        }
        if let Some(offset) = self.utc_offset_hours {
            config.utc_offset_hours = offset;
        }
        if let Some(decimals) = self.decimals {
            config.decimals = decimals;
        }
        if let Some(format) = self.bucket_format {
            config.bucket_format = format;
        }
        if let Some(every) = self.stream_refresh_every {
            config.stream_refresh_every = every;
        }
    }
}

/// Print an error and exit with status 1.
pub fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

pub fn resolve_config(
    path: Option<&str>,
    overrides: ConfigOverrides,
) -> telepivot_core::Result<ReportConfig> {
    let mut config = match path {
        Some(p) => ReportConfig::load_from_path(Path::new(p))?,
        None => ReportConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Load the config file (if any), apply overrides and validate, exiting on error.
pub fn load_config(path: Option<&str>, overrides: ConfigOverrides) -> ReportConfig {
    resolve_config(path, overrides).unwrap_or_else(|e| fail(e))
}

/// Read a whole input file, or stdin when `path` is "-".
pub fn read_input(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

pub fn try_load_dataset(input: &str, config: ReportConfig) -> telepivot_core::Result<Dataset> {
    let json = read_input(input)?;
    let records = load_records(&json)?;
    log::debug!("loaded {} records from {input}", records.len());
    Dataset::from_records(config, records)
}

/// Load records into a dataset, exiting on error.
pub fn load_dataset(input: &str, config: ReportConfig) -> Dataset {
    try_load_dataset(input, config).unwrap_or_else(|e| fail(format!("{input}: {e}")))
}

/// Print pretty JSON to stdout, or write it to `output`.
pub fn emit_json<T: Serialize>(value: &T, output: Option<&str>) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(e));
    match output {
        Some(path) => match std::fs::write(path, json) {
            Ok(()) => println!("Results written to {path}"),
            Err(e) => fail(format!("failed to write {path}: {e}")),
        },
        None => println!("{json}"),
    }
}

pub fn fmt_value(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

pub fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| fmt_value(v, decimals))
}

pub fn fmt_time(timestamp: &DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp
        .with_timezone(&offset)
        .format(DISPLAY_TIME_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // -----------------------------------------------------------------------
    // Config resolution
    // -----------------------------------------------------------------------

    #[test]
    fn overrides_beat_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("telepivot.json");
        std::fs::write(&path, r#"{"utc_offset_hours": 8, "decimals": 2, "title": "Bridge"}"#)
            .unwrap();

        let config = resolve_config(
            path.to_str(),
            ConfigOverrides {
                decimals: Some(4),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.utc_offset_hours, 8);
        assert_eq!(config.decimals, 4);
        assert_eq!(config.title, "Bridge");
    }

    #[test]
    fn invalid_override_is_rejected() {
        let result = resolve_config(
            None,
            ConfigOverrides {
                utc_offset_hours: Some(99),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_input_file_is_an_error() {
        assert!(try_load_dataset("/nonexistent/records.json", ReportConfig::default()).is_err());
    }

    #[test]
    fn loads_dataset_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("records.json");
        std::fs::write(
            &path,
            r#"[{"timestamp":"2024-01-01T00:00:00Z","target_name":"T1","key_name":"disp","value":1.5}]"#,
        )
        .unwrap();
        let dataset =
            try_load_dataset(path.to_str().unwrap(), ReportConfig::default()).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Formatting
    // -----------------------------------------------------------------------

    #[test]
    fn formats_values_with_fixed_decimals() {
        assert_eq!(fmt_value(2.0, 3), "2.000");
        assert_eq!(fmt_value(1.23456, 2), "1.23");
        assert_eq!(fmt_opt(None, 3), "-");
        assert_eq!(fmt_opt(Some(0.5), 1), "0.5");
    }

    #[test]
    fn formats_times_in_display_offset() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 20, 5, 9).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let cst = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(fmt_time(&ts, utc), "2024/01/01 20:05:09");
        assert_eq!(fmt_time(&ts, cst), "2024/01/02 04:05:09");
    }
}
