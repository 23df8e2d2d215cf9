//! Events scraper binary entrypoint.
//! Replays a recorded search session for each configured city, compares the
//! result with the previous run and saves it.

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use events_scraper::compare::{compare_runs, Trend};
use events_scraper::config::{load_config_default, resolve_cities};
use events_scraper::model::ScrapeReport;
use events_scraper::port::replay::ReplayPort;
use events_scraper::scraper::{scrape_cities, ScrapeRun};
use events_scraper::store::{load_report, save_report};

const ENV_REPLAY_PATH: &str = "SCRAPER_REPLAY_PATH";
const DEFAULT_REPLAY_PATH: &str = "config/replay.json";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("events_scraper=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

fn print_summary(run: &ScrapeRun) {
    if let Some(reason) = &run.aborted {
        println!("{}: aborted ({reason})", run.city);
        return;
    }
    if run.records.is_empty() {
        println!("{}: no events found", run.city);
        return;
    }
    println!("{}: {} events", run.city, run.records.len());
    for (i, ev) in run.records.iter().enumerate() {
        println!("  #{} {}", i + 1, ev.title);
        if let Some(d) = &ev.date_time {
            println!("     date: {d}");
        }
        if let Some(l) = &ev.location {
            println!("     location: {l}");
        }
        if let Some(u) = ev.urgency {
            println!("     urgency: {u:?}");
        }
        println!("     {}", ev.link);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env when present; no-op otherwise.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default().context("loading scraper config")?;
    let cities = resolve_cities(&cfg);

    let replay_path = std::env::var(ENV_REPLAY_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_REPLAY_PATH));
    let port = ReplayPort::from_path(&replay_path)?;

    tracing::info!(cities = ?cities, replay = %replay_path.display(), "scraper starting");

    let runs = scrape_cities(&port, &cfg, &cities).await;

    for run in &runs {
        print_summary(run);
        if run.aborted.is_some() || run.records.is_empty() {
            tracing::warn!(city = %run.city, "nothing to save");
            continue;
        }

        let report = ScrapeReport::new(&run.city, run.records.clone(), chrono::Local::now());
        match load_report(&cfg.output.dir, &run.city) {
            Ok(Some(previous)) => {
                let cmp = compare_runs(&previous, &report);
                let verb = match cmp.trend {
                    Trend::More => "more",
                    Trend::Fewer => "fewer",
                    Trend::Same => "same",
                };
                println!(
                    "  vs previous: {} -> {} ({:+}, {verb}), {} new, {} gone",
                    cmp.previous_total,
                    cmp.current_total,
                    cmp.delta,
                    cmp.new_links.len(),
                    cmp.dropped_links.len()
                );
            }
            Ok(None) => tracing::info!(city = %run.city, "no previous run"),
            Err(e) => tracing::warn!(city = %run.city, error = ?e, "previous run unreadable"),
        }

        let path = save_report(&cfg.output.dir, &report)?;
        println!("  saved to {}", path.display());
    }

    Ok(())
}
