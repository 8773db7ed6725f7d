use clap::Parser;
use failover_probe::runner::{
    DEFAULT_CONFIG_PATH, RunReport, UNKNOWN_USECASE, UseCaseResult, run_selector,
};
use std::path::PathBuf;

#[derive(Parser, Clone)]
#[command(about = "Synthetic write load and failover downtime probe for PostgreSQL")]
struct Args {
    /// Use case to run: 1 = dummy data generator, 2 = failover simulator, 99 = create table
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    usecase: i64,

    /// Path to the JSON run configuration
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Quiet mode - only warnings and the final summary
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing based on quiet mode
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if args.quiet {
        EnvFilter::new("failover_probe=warn,sqlx=off")
    } else {
        EnvFilter::new("failover_probe=info,sqlx=off")
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    println!("Usecase: {}", args.usecase);

    match run_selector(args.usecase, &args.config).await? {
        Some(UseCaseResult::Run(report)) => print_summary(&report),
        Some(UseCaseResult::TableReady) => println!("Table is ready"),
        None => println!("{UNKNOWN_USECASE}"),
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("Run Summary");
    println!("===========");
    println!("Run ID: {}", report.run_id);
    println!("Mode: {}", report.mode);
    println!("Start time: {}", report.started_at.to_rfc3339());
    println!("End time: {}", report.finished_at.to_rfc3339());
    println!("Duration: {:.2}s", report.duration.as_secs_f64());
    println!("Records written: {}", report.records_written());
    println!("Attempts: {}", report.stats.total_attempts);
    println!("Reconnects: {}", report.stats.reconnects);

    let downtimes = report.downtimes();
    if downtimes.is_empty() {
        println!("Downtime: none observed");
    } else {
        for (i, downtime) in downtimes.iter().enumerate() {
            println!("Downtime #{}: {}ms", i + 1, downtime.as_millis());
        }
    }

    if let (Some(p50), Some(p90), Some(p99)) = report.stats.get_percentiles() {
        println!("Write latency: p50: {}ms, p90: {}ms, p99: {}ms", p50, p90, p99);
    }
}
