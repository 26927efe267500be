//! Report export: CSV sheets, a self-contained HTML page, or JSON.
//!
//! All rounding happens here, using the configured number of decimals. The
//! core products carry full precision.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use telepivot_core::{PivotExport, Report, ReportConfig};

pub fn run(input: &str, format: &str, out_dir: &str, config: ReportConfig) {
    let dataset = super::load_dataset(input, config);
    if dataset.is_empty() {
        super::fail("no data to export");
    }
    let report = dataset.report();

    match write_report(&report, dataset.config(), format, Path::new(out_dir)) {
        Ok(paths) => {
            println!(
                "📄 Exported {} records ({} groups, {} time buckets):",
                report.records.len(),
                report.statistics.len(),
                report.pivot.rows.len()
            );
            for path in paths {
                println!("   {}", path.display());
            }
        }
        Err(e) => super::fail(format!("export to {out_dir} failed: {e}")),
    }
}

/// Write `report` into `dir` in the given format, returning the files written.
pub fn write_report(
    report: &Report,
    config: &ReportConfig,
    format: &str,
    dir: &Path,
) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let files: Vec<(&str, String)> = match format {
        "html" => vec![("report.html", render_html(report, config))],
        "json" => vec![("report.json", serde_json::to_string_pretty(report)?)],
        _ => vec![
            ("records.csv", records_csv(report, config)),
            ("pivot.csv", pivot_csv(&report.pivot, config)),
            ("statistics.csv", statistics_csv(report, config)),
            ("summary.csv", summary_csv(report, config)),
        ],
    };

    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = dir.join(name);
        std::fs::write(&path, contents)?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn display_offset(config: &ReportConfig) -> FixedOffset {
    config.offset().unwrap_or_else(|_| Utc.fix())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = fields
        .into_iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

pub fn records_csv(report: &Report, config: &ReportConfig) -> String {
    let offset = display_offset(config);
    let mut out = csv_row(["Time", "Asset", "Device", "Target", "Metric", "Value"]);
    for r in &report.records {
        out.push_str(&csv_row([
            super::fmt_time(&r.timestamp, offset),
            r.asset_name.clone(),
            r.device_name.clone(),
            r.target_name.clone(),
            r.key_name.clone(),
            super::fmt_value(r.value, config.decimals),
        ]));
    }
    out
}

pub fn pivot_csv(pivot: &PivotExport, config: &ReportConfig) -> String {
    let header = std::iter::once("Time".to_string())
        .chain(pivot.columns.iter().map(|k| k.label(&config.key_separator)));
    let mut out = csv_row(header);
    for row in &pivot.rows {
        let cells = row.cells.iter().map(|cell| match cell {
            Some(v) => super::fmt_value(*v, config.decimals),
            None => String::new(),
        });
        out.push_str(&csv_row(std::iter::once(row.time_bucket.clone()).chain(cells)));
    }
    out
}

pub fn statistics_csv(report: &Report, config: &ReportConfig) -> String {
    let offset = display_offset(config);
    let d = config.decimals;
    let mut out = csv_row([
        "Target", "Metric", "Count", "Mean", "Max", "Min", "StdDev", "Range", "First", "Last",
    ]);
    for s in &report.statistics {
        out.push_str(&csv_row([
            s.target_name.clone(),
            s.key_name.clone(),
            s.count.to_string(),
            super::fmt_value(s.mean, d),
            super::fmt_value(s.max, d),
            super::fmt_value(s.min, d),
            super::fmt_value(s.std_dev, d),
            super::fmt_value(s.range, d),
            super::fmt_time(&s.first_seen, offset),
            super::fmt_time(&s.last_seen, offset),
        ]));
    }
    out
}

/// Label/value pairs shared by the summary sheet and the HTML cards.
fn summary_items(report: &Report, config: &ReportConfig) -> Vec<(&'static str, String)> {
    let s = &report.summary;
    let d = config.decimals;
    let offset = display_offset(config);
    let time = |t: Option<chrono::DateTime<Utc>>| {
        t.map_or_else(|| "-".to_string(), |t| super::fmt_time(&t, offset))
    };
    vec![
        ("Total points", s.point_count.to_string()),
        ("Targets", s.target_count.to_string()),
        ("Metrics", s.key_count.to_string()),
        (
            "Time span",
            s.time_span_hours
                .map_or_else(|| "-".to_string(), |h| format!("{h:.1} h")),
        ),
        ("Start time", time(s.start_time)),
        ("End time", time(s.end_time)),
        ("Mean", super::fmt_opt(s.mean, d)),
        ("Max", super::fmt_opt(s.max, d)),
        ("Min", super::fmt_opt(s.min, d)),
        ("Range", super::fmt_opt(s.range, d)),
    ]
}

pub fn summary_csv(report: &Report, config: &ReportConfig) -> String {
    let mut out = csv_row(["Item", "Value"]);
    for (label, value) in summary_items(report, config) {
        out.push_str(&csv_row([label.to_string(), value]));
    }
    out
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;color:#222;background:#f7f8fa}\
h1{margin-bottom:.2rem}.meta{color:#666;margin-bottom:1.5rem}\
.cards{display:grid;grid-template-columns:repeat(auto-fit,minmax(160px,1fr));gap:.8rem;margin-bottom:2rem}\
.card{background:#fff;border-radius:6px;padding:.8rem 1rem;box-shadow:0 1px 3px rgba(0,0,0,.1)}\
.label{font-size:.8rem;color:#666}.value{font-size:1.2rem;font-weight:600}\
table{border-collapse:collapse;background:#fff;margin-bottom:2rem;font-size:.9rem}\
th,td{border:1px solid #ddd;padding:.3rem .6rem;text-align:right}\
th{background:#eef1f5}td:first-child,th:first-child{text-align:left}";

/// Render a single self-contained HTML page (no external assets).
pub fn render_html(report: &Report, config: &ReportConfig) -> String {
    let d = config.decimals;
    let title = html_escape(&report.title);
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n<div class=\"meta\">Generated {} · report {}</div>\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.id,
    );

    html.push_str("<h2>Summary</h2>\n<div class=\"cards\">\n");
    for (label, value) in summary_items(report, config) {
        let _ = writeln!(
            html,
            "<div class=\"card\"><div class=\"label\">{label}</div><div class=\"value\">{}</div></div>",
            html_escape(&value)
        );
    }
    html.push_str("</div>\n");

    html.push_str(
        "<h2>Statistics</h2>\n<table>\n<thead><tr><th>Target</th><th>Metric</th><th>Count</th>\
         <th>Mean</th><th>Max</th><th>Min</th><th>StdDev</th><th>Range</th></tr></thead>\n<tbody>\n",
    );
    for s in &report.statistics {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&s.target_name),
            html_escape(&s.key_name),
            s.count,
            super::fmt_value(s.mean, d),
            super::fmt_value(s.max, d),
            super::fmt_value(s.min, d),
            super::fmt_value(s.std_dev, d),
            super::fmt_value(s.range, d),
        );
    }
    html.push_str("</tbody>\n</table>\n");

    html.push_str("<h2>Pivot table</h2>\n<table>\n<thead><tr><th>Time</th>");
    for key in &report.pivot.columns {
        let _ = write!(html, "<th>{}</th>", html_escape(&key.label(&config.key_separator)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &report.pivot.rows {
        let _ = write!(html, "<tr><td>{}</td>", html_escape(&row.time_bucket));
        for cell in &row.cells {
            let _ = write!(html, "<td>{}</td>", super::fmt_opt(*cell, d));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use telepivot_core::{Dataset, TelemetryRecord};

    fn rec(target: &str, secs: u32, value: f64) -> TelemetryRecord {
        TelemetryRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap(),
            asset_name: "Bridge, north".to_string(),
            device_name: "D".to_string(),
            target_name: target.to_string(),
            key_name: "disp".to_string(),
            value,
        }
    }

    fn report() -> (Report, ReportConfig) {
        let config = ReportConfig {
            title: "<Bridge> & co".to_string(),
            ..Default::default()
        };
        let dataset = Dataset::from_records(
            config.clone(),
            vec![rec("T1", 0, 1.0), rec("T1", 0, 3.0), rec("T2", 1, 0.5)],
        )
        .unwrap();
        (dataset.report(), config)
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn pivot_sheet_has_empty_cells_for_missing_values() {
        let (report, config) = report();
        let csv = pivot_csv(&report.pivot, &config);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Time,T1-disp,T2-disp");
        assert_eq!(lines[1], "2024-01-01 00:00:00,2.000,");
        assert_eq!(lines[2], "2024-01-01 00:00:01,,0.500");
    }

    #[test]
    fn records_sheet_escapes_and_rounds() {
        let (report, config) = report();
        let csv = records_csv(&report, &config);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "2024/01/01 00:00:00,\"Bridge, north\",D,T1,disp,1.000"
        );
    }

    #[test]
    fn statistics_and_summary_sheets() {
        let (report, config) = report();
        let stats = statistics_csv(&report, &config);
        assert!(stats.lines().nth(1).unwrap().starts_with("T1,disp,2,2.000,3.000,1.000,1.000,2.000,"));

        let summary = summary_csv(&report, &config);
        assert!(summary.contains("Total points,3\n"));
        assert!(summary.contains("Targets,2\n"));
        assert!(summary.contains("Time span,0.0 h\n"));
    }

    #[test]
    fn html_is_self_contained_and_escaped() {
        let (report, config) = report();
        let html = render_html(&report, &config);
        assert!(html.contains("<title>&lt;Bridge&gt; &amp; co</title>"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("http://") && !html.contains("https://"));
        assert!(html.contains("<th>T2-disp</th>"));
        assert!(html.contains("<td>2.000</td><td>-</td>"));
    }

    #[test]
    fn writes_every_format_to_disk() {
        let (report, config) = report();
        let tmp = tempfile::tempdir().unwrap();

        let csv = write_report(&report, &config, "csv", tmp.path()).unwrap();
        let names: Vec<String> = csv
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["records.csv", "pivot.csv", "statistics.csv", "summary.csv"]);

        let html = write_report(&report, &config, "html", &tmp.path().join("html")).unwrap();
        assert!(html[0].ends_with("report.html"));

        let json = write_report(&report, &config, "json", tmp.path()).unwrap();
        let back: Report =
            serde_json::from_str(&std::fs::read_to_string(&json[0]).unwrap()).unwrap();
        assert_eq!(back.id, report.id);
        assert_eq!(back.records.len(), 3);
    }
}
