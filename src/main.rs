//! ailogs - Inspect, aggregate and export AI usage logs

use ailogs::{
    aggregation::Aggregator,
    cli::{Cli, Command},
    data_loader::DataLoader,
    error::Result,
    export::{ExportField, ExportOptions, export_logs},
    output::get_formatter,
    query_cache::LogQueryCache,
    timezone::TimezoneConfig,
    types::LogId,
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The --quiet flag overrides RUST_LOG
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ailogs=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let tz_config = TimezoneConfig::from_cli(cli.timezone.as_deref(), cli.utc)?;
    info!("Using timezone: {}", tz_config.display_name());

    let now = chrono::Utc::now();
    let criteria = cli.filters.to_criteria(&tz_config.tz, now)?;

    let show_progress = !cli.json && is_terminal::is_terminal(std::io::stdout());
    let loader = DataLoader::new(cli.data_dir.clone())?.with_progress(show_progress);
    info!("Reading logs from {}", loader.logs_dir().display());

    let cache = LogQueryCache::new(Arc::new(loader));
    let formatter = get_formatter(cli.json, tz_config.tz);

    match cli.command {
        Command::List {
            sort,
            page,
            page_size,
        } => {
            let criteria = criteria.with_sort(sort.directive());
            let page = cache.query(&criteria, page_size, page).await?;
            println!("{}", formatter.format_logs(&page));
        }

        Command::Summary => {
            let logs = cache.all(&criteria).await?;
            println!("{}", formatter.format_summary(&Aggregator::summarize(&logs)));
        }

        Command::Daily { days } => {
            let logs = cache.all(&criteria).await?;
            let aggregator = Aggregator::new(tz_config);
            let buckets = aggregator.bucket_by_day(&logs, days, now);
            println!("{}", formatter.format_daily(&buckets));
        }

        Command::Breakdown => {
            let logs = cache.all(&criteria).await?;
            println!(
                "{}",
                formatter.format_breakdown(&Aggregator::cost_breakdown(&logs))
            );
        }

        Command::Trends { days } => {
            let logs = cache.all(&criteria).await?;
            let (current, previous) = Aggregator::trend_periods(&logs, days, now)?;
            info!(
                "Comparing {} logs against {} from the previous {} days",
                current.len(),
                previous.len(),
                days
            );
            let metrics = Aggregator::compute_trend_metrics(&current, &previous);
            println!("{}", formatter.format_trends(&metrics));
        }

        Command::Export {
            sort,
            format,
            fields,
            output,
        } => {
            let mut options =
                ExportOptions::new(format).with_criteria(criteria.with_sort(sort.directive()));
            if let Some(fields) = fields {
                options = options.with_fields(ExportField::parse_list(&fields));
            }

            let today = tz_config.today(now);
            let artifact = export_logs(cache.source(), &options, *today.inner()).await?;
            let path = artifact.write_to_dir(&output)?;
            println!(
                "Exported {} logs to {}",
                artifact.record_count,
                path.display()
            );
        }

        Command::Delete { id } => {
            let id = LogId::new(id);
            cache.delete_log(&id).await?;
            println!("Deleted log {id}");
        }
    }

    Ok(())
}
