//! CLI for telepivot: statistics, pivot tables and reports from telemetry exports.

mod commands;

use clap::{Parser, Subcommand};

use commands::ConfigOverrides;

#[derive(Parser)]
#[command(name = "telepivot")]
#[command(about = "telepivot: group statistics, pivot tables and reports for telemetry time series")]
#[command(version = telepivot_core::VERSION)]
struct Cli {
    /// Report configuration JSON. Missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Hours east of UTC used for time buckets and displayed times (e.g. 8)
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// Decimal places for rendered values
    #[arg(long, global = true)]
    decimals: Option<usize>,

    /// chrono strftime pattern for pivot time buckets
    #[arg(long, global = true)]
    bucket_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per (target, metric) count, mean, min, max, std-dev and range
    Stats {
        /// Records JSON file ("-" for stdin)
        input: String,

        /// Output format
        #[arg(long, default_value = "table", value_parser = ["table", "json"])]
        format: String,

        /// Write JSON results to path instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Wide table: one row per time bucket, one column per (target, metric)
    Pivot {
        /// Records JSON file ("-" for stdin)
        input: String,

        /// Output format
        #[arg(long, default_value = "table", value_parser = ["table", "json", "csv"])]
        format: String,

        /// Write results to path instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Whole-dataset point count, time span and value range
    Summary {
        /// Records JSON file ("-" for stdin)
        input: String,

        /// Output format
        #[arg(long, default_value = "table", value_parser = ["table", "json"])]
        format: String,
    },

    /// Export records, pivot, statistics and summary as CSV sheets, HTML or JSON
    Export {
        /// Records JSON file ("-" for stdin)
        input: String,

        /// Export format
        #[arg(long, default_value = "csv", value_parser = ["csv", "html", "json"])]
        format: String,

        /// Output directory (created if missing)
        #[arg(long, default_value = "report")]
        out_dir: String,

        /// Report title
        #[arg(long)]
        title: Option<String>,
    },

    /// Consume a recorded event stream (SSE or NDJSON), reporting as it loads
    Stream {
        /// Stream file ("-" for stdin)
        input: String,

        /// Print a partial summary every N records
        #[arg(long)]
        refresh_every: Option<usize>,

        /// Write the final report as JSON to path
        #[arg(long)]
        output: Option<String>,
    },

    /// Start the HTTP report server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8043")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut overrides = ConfigOverrides {
        utc_offset_hours: cli.utc_offset,
        decimals: cli.decimals,
        bucket_format: cli.bucket_format,
        ..Default::default()
    };

    match cli.command {
        Commands::Stats {
            input,
            format,
            output,
        } => {
            let config = commands::load_config(cli.config.as_deref(), overrides);
            commands::stats::run(&input, &format, output.as_deref(), config)
        }
        Commands::Pivot {
            input,
            format,
            output,
        } => {
            let config = commands::load_config(cli.config.as_deref(), overrides);
            commands::pivot::run(&input, &format, output.as_deref(), config)
        }
        Commands::Summary { input, format } => {
            let config = commands::load_config(cli.config.as_deref(), overrides);
            commands::summary::run(&input, &format, config)
        }
        Commands::Export {
            input,
            format,
            out_dir,
            title,
        } => {
            overrides.title = title;
            let config = commands::load_config(cli.config.as_deref(), overrides);
            commands::export::run(&input, &format, &out_dir, config)
        }
        Commands::Stream {
            input,
            refresh_every,
            output,
        } => {
            overrides.stream_refresh_every = refresh_every;
            let config = commands::load_config(cli.config.as_deref(), overrides);
            commands::stream::run(&input, output.as_deref(), config)
        }
        Commands::Serve { port, host } => {
            let config = commands::load_config(cli.config.as_deref(), overrides);
            commands::server::run(&host, port, config)
        }
    }
}
