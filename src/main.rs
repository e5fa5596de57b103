use anyhow::{Context, Result, bail};
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use fbref_possession::config::ScrapeConfig;
use fbref_possession::fetch::{Fetcher, HttpTransport, SystemClock};
use fbref_possession::league::League;
use fbref_possession::ledger::Ledger;
use fbref_possession::runner::{RunSummary, SeasonRunner};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fbref_possession=info,warn")),
        )
        .init();

    let mut config = ScrapeConfig::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let rejected = config.apply_args(&args);
    if !rejected.is_empty() {
        bail!(
            "unrecognised arguments: {} (expected years, --league, --seasons, --ledger, --reset, --json)",
            rejected.join(" ")
        );
    }
    if config.seasons.is_empty() {
        bail!("no seasons given (pass years like `2021 2022` or set FBREF_SEASONS)");
    }

    let (requests, unknown) = config.requests();
    if !unknown.is_empty() {
        let known = League::all().map(League::name).collect::<Vec<_>>();
        for name in &unknown {
            error!(league = %name, known = %known.join(", "), "no listing url for league, skipping its seasons");
        }
    }

    let ledger = Ledger::open(config.ledger_path.clone())?;
    let transport = HttpTransport::shared(config.request_timeout)?;
    let fetcher = Fetcher::new(transport, SystemClock, config.policy);
    let mut runner = SeasonRunner::new(fetcher, ledger);
    let summary = runner.run(&requests, config.reset)?;

    if config.json {
        let json = serde_json::to_string_pretty(&summary).context("serialize run summary")?;
        println!("{json}");
    } else {
        print_summary(&summary, &unknown);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, unknown: &[String]) {
    println!("Scrape complete");
    println!("Ledger: {}", summary.ledger_path.display());
    println!(
        "Matches: {} recorded, {} failed, {} skipped",
        summary.recorded, summary.failed, summary.skipped
    );
    for season in &summary.seasons {
        println!(
            "{} {}: links={} recorded={} failed={} skipped={}",
            season.league,
            season.season,
            season.links_found,
            season.recorded,
            season.failed,
            season.skipped
        );
        if let Some(err) = &season.error {
            println!("  error: {err}");
        }
    }
    if !unknown.is_empty() {
        println!("Unknown leagues skipped: {}", unknown.join(", "));
    }
}
