use telepivot_core::ReportConfig;

pub fn run(host: &str, port: u16, config: ReportConfig) {
    let base = format!("http://{host}:{port}");

    println!("📊 telepivot server v{}", telepivot_core::VERSION);
    println!("   {base}");
    println!(
        "   Buckets: {:?} at UTC{:+}",
        config.bucket_format, config.utc_offset_hours
    );
    println!();
    println!("   Endpoints:");
    println!("     GET  /                    API index (try: curl {base})");
    println!("     GET  /health              Health check");
    println!("     POST /api/v1/statistics   Per (target, metric) statistics");
    println!("     POST /api/v1/pivot        Time bucket × (target, metric) table");
    println!("     POST /api/v1/summary      Whole-dataset summary");
    println!("     POST /api/v1/report       All products in one document");
    println!();
    println!("   Example:");
    println!("     curl -X POST --data-binary @records.json {base}/api/v1/report");
    println!();

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| super::fail(e));
    if let Err(e) = rt.block_on(telepivot_server::run_server(config, host, port)) {
        super::fail(format!("server on {host}:{port} stopped: {e}"));
    }
}
