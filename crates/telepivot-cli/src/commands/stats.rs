use telepivot_core::ReportConfig;

pub fn run(input: &str, format: &str, output_path: Option<&str>, config: ReportConfig) {
    let dataset = super::load_dataset(input, config);
    let rows = dataset.groups().rows();

    if format == "json" || output_path.is_some() {
        super::emit_json(&rows, output_path);
        return;
    }

    if rows.is_empty() {
        println!("No records.");
        return;
    }

    let config = dataset.config();
    let offset = dataset.formatter().offset();
    let d = config.decimals;
    let sep = &config.key_separator;

    println!(
        "{:<24} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12}  {:<19}  {:<19}",
        "Group", "Count", "Mean", "Min", "Max", "StdDev", "Range", "First", "Last"
    );
    println!("{}", "-".repeat(140));
    for row in &rows {
        let label = format!("{}{sep}{}", row.target_name, row.key_name);
        println!(
            "{:<24} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12}  {:<19}  {:<19}",
            label,
            row.count,
            super::fmt_value(row.mean, d),
            super::fmt_value(row.min, d),
            super::fmt_value(row.max, d),
            super::fmt_value(row.std_dev, d),
            super::fmt_value(row.range, d),
            super::fmt_time(&row.first_seen, offset),
            super::fmt_time(&row.last_seen, offset),
        );
    }
    println!("\n{} group(s), {} record(s)", rows.len(), dataset.len());
}
