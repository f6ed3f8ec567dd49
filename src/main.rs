use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use rmrb_archive::archiver::merge_existing;
use rmrb_archive::cli::{Cli, Commands};
use rmrb_archive::config::Config;
use rmrb_archive::locator::LocatorSelection;
use rmrb_archive::models::{DateKey, DayOutcome};
use rmrb_archive::pacer::Pacer;
use rmrb_archive::transport::HttpTransport;
use rmrb_archive::Archiver;

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "rmrb_archive=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "rmrb-archive.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(root) = &cli.root {
        config.root = root.into();
    }
    config.validate()?;

    let transport = Arc::new(HttpTransport::new(&config)?);

    match &cli.command {
        Commands::Run {
            from,
            to,
            year,
            strategy,
            tolerate_bad_pages,
            force,
            json,
        } => {
            let kind = Commands::parse_strategy(strategy)?;
            let dates = Commands::run_dates(*from, *to, *year)?;
            info!(
                "Starting run over {} dates with {} strategy",
                dates.len(),
                kind.as_str()
            );

            let archiver = Archiver::new(
                transport,
                LocatorSelection::from_config(
                    &config,
                    kind,
                    Commands::failure_policy(*tolerate_bad_pages),
                ),
                config.layout(),
                Pacer::new("download", config.download_delay()),
                Pacer::new("day", config.day_delay()),
            )
            .with_force(*force);

            let summary = archiver.run(&dates).await;
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Processed {} dates: {} merged, {} already merged, {} without links, {} without files, {} merge failures",
                    summary.dates,
                    summary.merged,
                    summary.already_merged,
                    summary.no_urls,
                    summary.no_files,
                    summary.merge_failed
                );
            }
        }

        Commands::Resolve {
            date,
            strategy,
            tolerate_bad_pages,
        } => {
            let kind = Commands::parse_strategy(strategy)?;
            let selection = LocatorSelection::from_config(
                &config,
                kind,
                Commands::failure_policy(*tolerate_bad_pages),
            );

            let date = DateKey::new(*date);
            let urls = selection.resolve(transport.as_ref(), date).await;
            if urls.is_empty() {
                error!("No PDF links found for {}", date);
            }
            println!("{}:", date);
            for url in urls {
                println!("{}", url);
            }
        }

        Commands::Merge { date } => {
            let date = DateKey::new(*date);
            let outcome = merge_existing(&config.layout(), date)
                .with_context(|| format!("Merge failed for {}", date))?;
            match outcome {
                DayOutcome::Merged { pages, rejected } => {
                    println!("{}: merged {} files ({} rejected)", date, pages, rejected)
                }
                DayOutcome::MergeFailed(reason) => {
                    anyhow::bail!("Merge failed for {}: {}", date, reason)
                }
                outcome => println!("{}: {}", date, outcome.as_str()),
            }
        }
    }

    Ok(())
}
