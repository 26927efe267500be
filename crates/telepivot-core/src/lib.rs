//! # telepivot-core
//!
//! **Statistics, pivot tables and summaries for telemetry time series.**
//!
//! `telepivot-core` takes telemetry records that were already fetched and
//! filtered upstream (one value per target, metric and timestamp) and derives
//! the data products a dashboard export needs.
//!
//! ## Quick Start
//!
//! ```
//! use telepivot_core::{Dataset, ReportConfig, load_records};
//!
//! let json = r#"[
//!     {"timestamp": "2024-01-01T00:00:00Z", "asset_name": "A", "device_name": "D",
//!      "target_name": "T1", "key_name": "disp", "value": 1.0},
//!     {"timestamp": "2024-01-01T00:00:00Z", "asset_name": "A", "device_name": "D",
//!      "target_name": "T1", "key_name": "disp", "value": 3.0}
//! ]"#;
//!
//! let records = load_records(json).unwrap();
//! let dataset = Dataset::from_records(ReportConfig::default(), records).unwrap();
//!
//! let stats = dataset.groups().rows();
//! assert_eq!(stats[0].count, 2);
//! assert_eq!(stats[0].mean, 2.0);
//! assert_eq!(dataset.summary().point_count, 2);
//! ```
//!
//! ## Architecture
//!
//! Records → validation → (Aggregator, Pivot reshaper, Summary builder) → Report
//!
//! - [`GroupedStats`]: per `(target, metric)` accumulators. Mean, population
//!   standard deviation and range are derived on read.
//! - [`PivotTable`]: time buckets × group keys. Colliding values are averaged
//!   with a true mean, independent of arrival order.
//! - [`SummaryStats`]: whole-dataset counts, time span and value range.
//!
//! Every accumulator supports `push` and `merge`, so a [`Dataset`] can be
//! fed one record at a time while a stream is still arriving.

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod key;
pub mod pivot;
pub mod record;
pub mod report;
pub mod stream;
pub mod summary;

pub use aggregate::{GroupStats, GroupStatsRow, GroupedStats, aggregate};
pub use config::{BucketFormatter, ReportConfig};
pub use dataset::Dataset;
pub use error::{Error, Result, ValidationError};
pub use key::GroupKey;
pub use pivot::{PivotExport, PivotExportRow, PivotRow, PivotTable, pivot};
pub use record::{
    RawRecord, TelemetryRecord, load_records, parse_timestamp, record_from_value,
    validate_records,
};
pub use report::Report;
pub use stream::{StreamDecoder, StreamEvent, StreamIngest, StreamMessage, StreamStatus};
pub use summary::{SummaryBuilder, SummaryStats, summarize};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
