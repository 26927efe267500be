use std::io::BufRead;

use telepivot_core::{
    Dataset, Error, ReportConfig, StreamDecoder, StreamEvent, StreamIngest, StreamStatus,
    SummaryStats,
};

/// Feed every line of `reader` through the decoder into `ingest`.
///
/// Records that fail validation are logged and skipped; protocol errors
/// stop the stream. Calls `on_refresh` each time a partial view is due.
pub fn consume<R, F>(
    reader: R,
    ingest: &mut StreamIngest,
    mut on_refresh: F,
) -> telepivot_core::Result<()>
where
    R: BufRead,
    F: FnMut(&Dataset),
{
    let mut decoder = StreamDecoder::new();
    for line in reader.lines() {
        if let Some(message) = decoder.feed_line(&line?)? {
            apply(ingest, message, &mut on_refresh)?;
        }
        if ingest.is_finished() {
            break;
        }
    }
    if ingest.is_finished() {
        return Ok(());
    }
    if let Some(message) = decoder.finish()? {
        apply(ingest, message, &mut on_refresh)?;
    }
    Ok(())
}

fn apply<F: FnMut(&Dataset)>(
    ingest: &mut StreamIngest,
    message: telepivot_core::StreamMessage,
    on_refresh: &mut F,
) -> telepivot_core::Result<()> {
    match ingest.apply(message) {
        Ok(StreamEvent::Record { refresh: true, .. }) => on_refresh(ingest.dataset()),
        Ok(StreamEvent::Progress { loaded }) => log::info!("server reports {loaded} records loaded"),
        Ok(_) => {}
        Err(Error::Validation(e)) => log::warn!("skipping streamed record: {e}"),
        Err(e) => return Err(e),
    }
    Ok(())
}

fn print_progress(summary: &SummaryStats, decimals: usize) {
    println!(
        "  ... {} records, {} target(s), {} metric(s), mean {}, range {}",
        summary.point_count,
        summary.target_count,
        summary.key_count,
        super::fmt_opt(summary.mean, decimals),
        super::fmt_opt(summary.range, decimals),
    );
}

pub fn run(input: &str, output_path: Option<&str>, config: ReportConfig) {
    let decimals = config.decimals;
    let dataset = Dataset::new(config).unwrap_or_else(|e| super::fail(e));
    let mut ingest = StreamIngest::new(dataset);
    let on_refresh = |d: &Dataset| print_progress(&d.summary(), decimals);

    let result = if input == "-" {
        consume(std::io::stdin().lock(), &mut ingest, on_refresh)
    } else {
        match std::fs::File::open(input) {
            Ok(file) => consume(std::io::BufReader::new(file), &mut ingest, on_refresh),
            Err(e) => super::fail(format!("{input}: {e}")),
        }
    };
    if let Err(e) = result {
        super::fail(format!("{input}: {e}"));
    }

    if ingest.rejected() > 0 {
        eprintln!(
            "Warning: {} of {} streamed records failed validation and were skipped",
            ingest.rejected(),
            ingest.received()
        );
    }

    match ingest.status().clone() {
        StreamStatus::Completed { total, limited } => {
            if limited {
                println!("Loaded {total} records (limit reached)");
            } else {
                println!("Load complete: {total} records");
            }
        }
        StreamStatus::Failed { message } => super::fail(format!("stream failed: {message}")),
        StreamStatus::Open => {
            eprintln!("Warning: stream ended without a completion message; results may be partial");
        }
    }

    let dataset = ingest.into_dataset();
    print_progress(&dataset.summary(), decimals);
    if let Some(path) = output_path {
        super::emit_json(&dataset.report(), Some(path));
    }
}
