use telepivot_core::ReportConfig;

pub fn run(input: &str, format: &str, config: ReportConfig) {
    let dataset = super::load_dataset(input, config);
    let summary = dataset.summary();

    if format == "json" {
        super::emit_json(&summary, None);
        return;
    }

    let d = dataset.config().decimals;
    let offset = dataset.formatter().offset();
    let time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map_or_else(|| "-".to_string(), |t| super::fmt_time(&t, offset))
    };

    println!("  ┌─ {}", dataset.config().title);
    println!("  │ Points:      {}", summary.point_count);
    println!("  │ Targets:     {}", summary.target_count);
    println!("  │ Metrics:     {}", summary.key_count);
    println!("  │ Start:       {}", time(summary.start_time));
    println!("  │ End:         {}", time(summary.end_time));
    println!(
        "  │ Span:        {} h",
        super::fmt_opt(summary.time_span_hours, 2)
    );
    println!("  │ Mean:        {}", super::fmt_opt(summary.mean, d));
    println!("  │ Min:         {}", super::fmt_opt(summary.min, d));
    println!("  │ Max:         {}", super::fmt_opt(summary.max, d));
    println!("  │ Range:       {}", super::fmt_opt(summary.range, d));
    println!("  └─");
}
