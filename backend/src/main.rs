//! Racoon CLI - COVID-19 time series per country
//!
//! # Main Commands
//!
//! ```bash
//! racoon serve                              # Start HTTP API (port 3000)
//! racoon series --metric deaths -c Germany  # One metric, per country
//! racoon dashboard -c Germany -c Italy      # Confirmed and deaths together
//! racoon countries                          # List country names
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! racoon parse input.csv                    # Just parse CSV to JSON rows
//! ```
//!
//! `--source <url-or-dir>` overrides `PUBLIC_URL` / `RACOON_DATA_DIR`.

use clap::{Args, Parser, Subcommand};
use racoon::{
    load_dashboard, load_metric, load_until, parse_file, select_countries, transform_bytes,
    AggregateMode, AggregateOptions, Config, DataSource, LoadOptions, Metric, MetricData,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "racoon")]
#[command(
    about = "Reshape COVID-19 time-series CSVs into per-country daily series",
    long_about = None
)]
struct Cli {
    /// Dataset base URL or local directory
    #[arg(short, long, global = true)]
    source: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct AggregateArgs {
    /// Sum split rows by date instead of column position
    #[arg(long)]
    by_date: bool,

    /// Trim and collapse whitespace in country names before grouping
    #[arg(long)]
    normalize: bool,
}

impl From<AggregateArgs> for LoadOptions {
    fn from(args: AggregateArgs) -> Self {
        LoadOptions {
            aggregate: AggregateOptions {
                mode: if args.by_date {
                    AggregateMode::ByDate
                } else {
                    AggregateMode::Positional
                },
                normalize_keys: args.normalize,
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON rows
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregated series of one metric
    Series {
        /// confirmed or deaths
        #[arg(short, long, default_value = "confirmed")]
        metric: Metric,

        /// Countries to output (default: all); repeatable
        #[arg(short, long = "country")]
        countries: Vec<String>,

        /// Read this CSV file instead of fetching the dataset
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        aggregate: AggregateArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Confirmed and deaths series side by side
    Dashboard {
        /// Countries to output (default: all); repeatable
        #[arg(short, long = "country")]
        countries: Vec<String>,

        #[command(flatten)]
        aggregate: AggregateArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List country names of a dataset
    Countries {
        /// confirmed or deaths
        #[arg(short, long, default_value = "confirmed")]
        metric: Metric,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: RACOON_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        #[command(flatten)]
        aggregate: AggregateArgs,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let source = match cli.source.as_deref() {
        Some(location) => DataSource::parse(location),
        None => config.source(),
    };

    match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Series {
            metric,
            countries,
            input,
            aggregate,
            output,
        } => {
            let data = match input {
                Some(path) => {
                    eprintln!("📄 Reading: {}", path.display());
                    let bytes = fs::read(&path)?;
                    transform_bytes(metric, &bytes, aggregate.into())?
                }
                None => fetch_metric(&source, metric, aggregate.into()).await?,
            };
            cmd_series(data, &countries, output.as_deref())
        }

        Commands::Dashboard {
            countries,
            aggregate,
            output,
        } => cmd_dashboard(&source, &countries, aggregate.into(), output.as_deref()).await,

        Commands::Countries { metric } => {
            let data = fetch_metric(&source, metric, LoadOptions::default()).await?;
            for country in data.series.keys() {
                println!("{}", country);
            }
            Ok(())
        }

        Commands::Serve { port, aggregate } => {
            let port = port.unwrap_or(config.port);
            racoon::server::start_server(port, source, aggregate.into()).await
        }
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Columns: {}", result.headers.len());
    eprintln!("✅ Parsed {} rows", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

async fn fetch_metric(
    source: &DataSource,
    metric: Metric,
    options: LoadOptions,
) -> Result<MetricData, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let data = load_until(load_metric(&client, source, metric, options), ctrl_c()).await?;
    Ok(data)
}

fn cmd_series(
    data: MetricData,
    countries: &[String],
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let series = if countries.is_empty() {
        data.series
    } else {
        warn_unknown(countries, |c| data.series.contains_key(c));
        select_countries(&data.series, countries)
    };

    eprintln!("📦 {} {} series", series.len(), data.metric);

    let json = serde_json::to_string_pretty(&series)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_dashboard(
    source: &DataSource,
    countries: &[String],
    options: LoadOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let dashboard = load_until(load_dashboard(&client, source, options), ctrl_c()).await?;

    let combined = if countries.is_empty() {
        dashboard.combined
    } else {
        warn_unknown(countries, |c| dashboard.combined.contains_key(c));
        select_countries(&dashboard.combined, countries)
    };

    let json = serde_json::to_string_pretty(&combined)?;
    write_output(&json, output)?;

    Ok(())
}

fn warn_unknown(countries: &[String], known: impl Fn(&str) -> bool) {
    for country in countries.iter().filter(|c| !known(c)) {
        eprintln!("⚠️  Unknown country: {}", country);
    }
}

async fn ctrl_c() {
    let _ = tokio::signal::ctrl_c().await;
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
