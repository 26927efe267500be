//! Integration tests for telepivot-core.
//!
//! These tests drive the full pipeline:
//! JSON input → validation → statistics / pivot / summary → report.

use rand::seq::SliceRandom;
use telepivot_core::{
    Dataset, Error, GroupKey, Report, ReportConfig, StreamDecoder, StreamIngest, StreamStatus,
    TelemetryRecord, aggregate, load_records, pivot, summarize,
};

fn record_json(target: &str, key: &str, timestamp: &str, value: &str) -> String {
    format!(
        r#"{{"timestamp":"{timestamp}","asset_name":"bridge","device_name":"gnss","target_name":"{target}","key_name":"{key}","value":{value}}}"#
    )
}

fn sample() -> Vec<TelemetryRecord> {
    let items = [
        record_json("T1", "disp", "2024-01-01T00:00:00Z", "1.0"),
        record_json("T1", "disp", "2024-01-01T00:00:00Z", "3.0"),
        record_json("T2", "disp", "2024-01-01T00:00:01Z", "-0.5"),
        record_json("T1", "temp", "2024-01-01T00:30:00Z", "21.25"),
        record_json("T2", "disp", "2024-01-01T01:00:00Z", "0.5"),
        record_json("T1", "disp", "2024-01-01T02:00:00Z", "4.0"),
    ];
    load_records(&format!("[{}]", items.join(","))).unwrap()
}

fn seconds(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// Worked example
// ---------------------------------------------------------------------------

#[test]
fn two_collisions_produce_expected_products() {
    let json = format!(
        "[{},{}]",
        record_json("T1", "disp", "2024-01-01T00:00:00Z", "1.0"),
        record_json("T1", "disp", "2024-01-01T00:00:00Z", "3.0"),
    );
    let records = load_records(&json).unwrap();

    let table = pivot(&records, seconds);
    assert_eq!(
        table.cell("2024-01-01 00:00:00", &GroupKey::new("T1", "disp")),
        Some(2.0)
    );

    let rows = aggregate(&records).rows();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.count, 2);
    assert_eq!(row.mean, 2.0);
    assert_eq!(row.std_dev, 1.0);
    assert_eq!(row.min, 1.0);
    assert_eq!(row.max, 3.0);
}

// ---------------------------------------------------------------------------
// Edge cases
// ---------------------------------------------------------------------------

#[test]
fn empty_input_never_fails() {
    let records = load_records("[]").unwrap();
    assert!(aggregate(&records).is_empty());
    assert!(pivot(&records, seconds).is_empty());

    let summary = summarize(&records);
    assert_eq!(summary.point_count, 0);
    assert_eq!(summary.target_count, 0);
    assert_eq!(summary.key_count, 0);
    assert!(summary.time_span_hours.is_none());

    let report = Report::build(records, &ReportConfig::default()).unwrap();
    assert!(report.is_empty());
}

#[test]
fn single_record_has_no_spread() {
    let records = load_records(&format!(
        "[{}]",
        record_json("T9", "tilt", "2024-06-01T12:00:00+08:00", "7.5")
    ))
    .unwrap();
    let row = &aggregate(&records).rows()[0];
    assert_eq!(row.std_dev, 0.0);
    assert_eq!(row.range, 0.0);
    assert_eq!(summarize(&records).time_span_hours, Some(0.0));
}

#[test]
fn validation_names_the_offending_record() {
    let cases = [
        (record_json("T1", "disp", "2024-01-01T00:00:00Z", "\"abc\""), "value"),
        (record_json("T1", "disp", "2024-01-01T00:00:00Z", "null"), "value"),
        (record_json("T1", "disp", "yesterday", "1.0"), "timestamp"),
    ];
    for (bad, field) in cases {
        let json = format!(
            "[{},{}]",
            record_json("T1", "disp", "2024-01-01T00:00:00Z", "1.0"),
            bad
        );
        match load_records(&json) {
            Err(Error::Validation(e)) => {
                assert_eq!(e.index, 1, "wrong index for {bad}");
                assert_eq!(e.field, field, "wrong field for {bad}");
            }
            other => panic!("expected validation error for {bad}, got {other:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn per_group_counts_and_bounds_hold() {
    let records = sample();
    let stats = aggregate(&records);
    for (key, group) in stats.iter() {
        let expected = records.iter().filter(|r| key.matches(r)).count() as u64;
        assert_eq!(group.count(), expected, "count mismatch for {key}");
        assert!(group.min() <= group.mean() && group.mean() <= group.max());
    }
}

#[test]
fn pivot_shape_matches_distinct_keys_and_buckets() {
    let records = sample();
    let table = pivot(&records, seconds);

    let mut keys: Vec<GroupKey> = records.iter().map(GroupKey::of).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(table.columns().cloned().collect::<Vec<_>>(), keys);

    let mut buckets: Vec<String> = records.iter().map(|r| seconds(&r.timestamp)).collect();
    buckets.sort();
    buckets.dedup();
    assert_eq!(table.buckets().map(str::to_string).collect::<Vec<_>>(), buckets);
}

#[test]
fn partitioned_dataset_equals_single_pass() {
    let records = sample();
    let whole = Dataset::from_records(ReportConfig::default(), records.clone()).unwrap();

    for split in 0..=records.len() {
        let mut left =
            Dataset::from_records(ReportConfig::default(), records[..split].to_vec()).unwrap();
        let right =
            Dataset::from_records(ReportConfig::default(), records[split..].to_vec()).unwrap();
        left.merge(&right);
        let (merged, single) = (left.groups().rows(), whole.groups().rows());
        assert_eq!(merged.len(), single.len(), "group count differs at split {split}");
        for (m, s) in merged.iter().zip(&single) {
            assert_eq!((&m.target_name, &m.key_name), (&s.target_name, &s.key_name));
            assert_eq!((m.count, m.min, m.max), (s.count, s.min, s.max));
            assert_eq!(m.mean, s.mean, "mean differs at split {split}");
            assert!((m.std_dev - s.std_dev).abs() < 1e-9, "std-dev differs at split {split}");
        }
        assert_eq!(left.pivot(), whole.pivot(), "pivot differs at split {split}");
        assert_eq!(left.summary(), whole.summary(), "summary differs at split {split}");
    }
}

#[test]
fn shuffled_input_gives_the_same_products() {
    let mut records = sample();
    let expected = Report::build(records.clone(), &ReportConfig::default()).unwrap();
    let mut rng = rand::rng();
    for _ in 0..10 {
        records.shuffle(&mut rng);
        let report = Report::build(records.clone(), &ReportConfig::default()).unwrap();
        assert_eq!(report.pivot, expected.pivot);
        assert_eq!(report.summary, expected.summary);
        assert_eq!(report.statistics.len(), expected.statistics.len());
        for (a, b) in report.statistics.iter().zip(&expected.statistics) {
            assert_eq!(a.count, b.count);
            assert_eq!(a.min, b.min);
            assert_eq!(a.max, b.max);
            assert!((a.mean - b.mean).abs() < 1e-12);
            assert!((a.std_dev - b.std_dev).abs() < 1e-9);
        }
    }
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[test]
fn streamed_records_match_batch_load() {
    let mut stream = String::new();
    for record in sample() {
        let item = serde_json::to_string(&record).unwrap();
        stream.push_str(&format!("data: {{\"type\":\"data\",\"item\":{item}}}\n\n"));
    }
    stream.push_str("data: {\"type\":\"progress\",\"loaded\":6}\n\n");
    stream.push_str("data: {\"type\":\"stats\",\"total\":6,\"limited\":false}\n\n");

    let mut ingest = StreamIngest::new(Dataset::new(ReportConfig::default()).unwrap());
    for message in StreamDecoder::decode_all(&stream).unwrap() {
        ingest.apply(message).unwrap();
    }
    assert_eq!(
        ingest.status(),
        &StreamStatus::Completed {
            total: 6,
            limited: false
        }
    );

    let batch = Dataset::from_records(ReportConfig::default(), sample()).unwrap();
    let streamed = ingest.into_dataset();
    assert_eq!(streamed.records(), batch.records());
    assert_eq!(streamed.summary(), batch.summary());
}
