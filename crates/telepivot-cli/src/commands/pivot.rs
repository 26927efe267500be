use telepivot_core::ReportConfig;

pub fn run(input: &str, format: &str, output_path: Option<&str>, config: ReportConfig) {
    let dataset = super::load_dataset(input, config);
    let export = dataset.pivot().to_export();

    match format {
        "json" => super::emit_json(&export, output_path),
        "csv" => {
            let csv = super::export::pivot_csv(&export, dataset.config());
            match output_path {
                Some(path) => match std::fs::write(path, csv) {
                    Ok(()) => println!("Pivot table written to {path}"),
                    Err(e) => super::fail(format!("failed to write {path}: {e}")),
                },
                None => print!("{csv}"),
            }
        }
        _ => {
            if output_path.is_some() {
                super::emit_json(&export, output_path);
                return;
            }
            if export.rows.is_empty() {
                println!("No records.");
                return;
            }
            let d = dataset.config().decimals;
            let sep = &dataset.config().key_separator;
            let labels: Vec<String> = export.columns.iter().map(|k| k.label(sep)).collect();
            let width = labels.iter().map(String::len).max().unwrap_or(0).max(d + 6);

            print!("{:<20}", "Time");
            for label in &labels {
                print!(" {label:>width$}");
            }
            println!();
            println!("{}", "-".repeat(20 + labels.len() * (width + 1)));
            for row in &export.rows {
                print!("{:<20}", row.time_bucket);
                for cell in &row.cells {
                    print!(" {:>width$}", super::fmt_opt(*cell, d));
                }
                println!();
            }
            println!(
                "\n{} bucket(s) × {} column(s)",
                export.rows.len(),
                export.columns.len()
            );
        }
    }
}
