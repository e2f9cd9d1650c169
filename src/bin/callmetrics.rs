use std::path::{Path, PathBuf};

use callmetrics::metrics::{self, TrendRow};
use callmetrics::{CallMetrics, Category, DateRange};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "callmetrics", about = "Carrier call metrics CLI")]
struct Cli {
    /// Database path (default: ~/.callmetrics/callmetrics.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import call records from a JSON array or newline-delimited JSON file
    Ingest {
        /// Path to the file ("-" reads stdin)
        file: PathBuf,
    },
    /// Show every metric bundle for a date range
    Report {
        /// Range (e.g. all, 2024, 2024-Q1, 2024-01, 2024-01-01..2024-01-31, 30d, mtd)
        #[arg(long)]
        range: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single metric bundle
    Metrics {
        #[command(subcommand)]
        target: MetricsTarget,
    },
    /// Show what the store holds
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum MetricsTarget {
    /// Total calls and cumulative average duration
    Volume {
        #[arg(long)]
        range: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Outcome shares and daily outcome counts
    Outcomes {
        #[arg(long)]
        range: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Negotiation rate and daily price increase
    Negotiation {
        #[arg(long)]
        range: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Daily carrier sentiment counts
    Sentiment {
        #[arg(long)]
        range: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

const NO_DATA: &str = "No data available. Start by ingesting some call data.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => callmetrics::Database::open_at(path).await?,
        None => callmetrics::Database::open().await?,
    };
    let cm = CallMetrics::new(db);

    match cli.command {
        Commands::Ingest { file } => handle_ingest(&cm, &file).await?,
        Commands::Report { range, json } => handle_report(&cm, range.as_deref(), json).await?,
        Commands::Metrics { target } => handle_metrics(&cm, target).await?,
        Commands::Status { json } => print_status(&cm, json).await?,
        Commands::Config { action } => handle_config(&cm, action).await?,
    }

    Ok(())
}

async fn resolve_range(cm: &CallMetrics, range: Option<&str>) -> anyhow::Result<DateRange> {
    let range = match range {
        Some(expr) => DateRange::parse(expr)?,
        None => cm.default_range().await?,
    };
    log::info!("using date range {range}");
    Ok(range)
}

async fn handle_ingest(cm: &CallMetrics, file: &Path) -> anyhow::Result<()> {
    let text = if file.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(file)?
    };
    let calls = callmetrics::ingest::parse_records(&text)?;
    let report = cm.ingest(calls).await?;
    println!("Ingested {} calls", report.inserted);
    if report.unparseable_dates > 0 {
        println!(
            "  {} with unparseable call dates (excluded from date-based trends)",
            report.unparseable_dates
        );
    }
    Ok(())
}

async fn handle_report(cm: &CallMetrics, range: Option<&str>, json: bool) -> anyhow::Result<()> {
    let range = resolve_range(cm, range).await?;
    let report = cm.report(&range).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Carrier Call Metrics ({})", report.range_key);
    if report.record_count == 0 {
        println!("  {NO_DATA}");
        return Ok(());
    }
    print_volume(&report.calls);
    print_outcomes(&report.outcomes);
    print_negotiation(&report.negotiation);
    print_sentiment(&report.sentiment);
    Ok(())
}

async fn handle_metrics(cm: &CallMetrics, target: MetricsTarget) -> anyhow::Result<()> {
    match target {
        MetricsTarget::Volume { range, json } => {
            let records = cm.fetch(&resolve_range(cm, range.as_deref()).await?).await?;
            let m = metrics::volume_and_duration_metrics(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&m)?);
            } else if records.is_empty() {
                println!("{NO_DATA}");
            } else {
                print_volume(&m);
            }
        }
        MetricsTarget::Outcomes { range, json } => {
            let records = cm.fetch(&resolve_range(cm, range.as_deref()).await?).await?;
            let m = metrics::outcome_metrics(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&m)?);
            } else if records.is_empty() {
                println!("{NO_DATA}");
            } else {
                print_outcomes(&m);
            }
        }
        MetricsTarget::Negotiation { range, json } => {
            let records = cm.fetch(&resolve_range(cm, range.as_deref()).await?).await?;
            let m = metrics::negotiation_metrics(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&m)?);
            } else if records.is_empty() {
                println!("{NO_DATA}");
            } else {
                print_negotiation(&m);
            }
        }
        MetricsTarget::Sentiment { range, json } => {
            let records = cm.fetch(&resolve_range(cm, range.as_deref()).await?).await?;
            let m = metrics::sentiment_metrics(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&m)?);
            } else if records.is_empty() {
                println!("{NO_DATA}");
            } else {
                print_sentiment(&m);
            }
        }
    }
    Ok(())
}

async fn print_status(cm: &CallMetrics, json: bool) -> anyhow::Result<()> {
    let status = cm.status().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Call store status:");
    println!("  Records: {}", status.total_records);
    match (&status.first_call_day, &status.last_call_day) {
        (Some(first), Some(last)) => println!("  Span:    {first} .. {last}"),
        _ => println!("  Span:    (no dated calls)"),
    }
    if !status.outcome_counts.is_empty() {
        println!("  Outcomes:");
        for (outcome, n) in &status.outcome_counts {
            println!("    {:<24} {n}", outcome.as_deref().unwrap_or("(none)"));
        }
    }
    Ok(())
}

async fn handle_config(cm: &CallMetrics, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match cm.config_get(&key).await? {
            Some(value) => println!("{value}"),
            None => println!("(not set)"),
        },
        ConfigAction::Set { key, value } => {
            cm.config_set(&key, &value).await?;
            println!("Set {key} = {value}");
        }
        ConfigAction::List => {
            let entries = cm.config_list().await?;
            if entries.is_empty() {
                println!("No config values set.");
            }
            for (key, value) in entries {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}

fn print_volume(m: &callmetrics::VolumeMetrics) {
    println!("  Calls:");
    println!("    Total calls:           {}", m.total_calls);
    if let Some(avg) = m.latest_avg_duration() {
        println!("    Average call duration: {avg:.1} seconds");
    }
    if !m.cumulative_avg_duration.is_empty() {
        println!("    Cumulative average duration:");
        for p in &m.cumulative_avg_duration {
            let when = p
                .call_date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "(undated)".to_string());
            println!("      {when:<16}  {:.1}", p.cumulative_avg_duration);
        }
    }
}

fn print_outcomes(m: &callmetrics::OutcomeMetrics) {
    println!("  Call Outcomes:");
    for &outcome in callmetrics::CallOutcome::ALL {
        println!(
            "    {:<20} {:.1}%",
            outcome.label(),
            m.current_metrics.get(outcome) * 100.0
        );
    }
    print_trend_table(&m.trends);
}

fn print_negotiation(m: &callmetrics::NegotiationMetrics) {
    println!("  Negotiation:");
    println!("    Negotiated calls: {:.1}%", m.negotiation_rate);
    if !m.price_increase_trends.is_empty() {
        println!("    Average price increase:");
        for p in &m.price_increase_trends {
            println!("      {}  {:+.1}%", p.date, p.price_increase);
        }
    }
}

fn print_sentiment(m: &callmetrics::SentimentMetrics) {
    println!("  Carrier Sentiment:");
    print_trend_table(&m.trends);
}

fn print_trend_table<C: Category>(rows: &[TrendRow<C>]) {
    if rows.is_empty() {
        println!("    No dated calls");
        return;
    }
    let header: Vec<String> = C::ALL.iter().map(|c| format!("{:>18}", c.label())).collect();
    println!("    {:<10} {}", "Date", header.join(""));
    for row in rows {
        let cells: Vec<String> = C::ALL
            .iter()
            .map(|&c| format!("{:>18}", row.count(c)))
            .collect();
        println!("    {} {}", row.date, cells.join(""));
    }
}
