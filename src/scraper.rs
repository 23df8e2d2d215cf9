// src/scraper.rs
//! City runs: every search approach goes through filter, loader and
//! extractor, then one reduce over everything collected.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

use crate::config::ScraperConfig;
use crate::dedup;
use crate::extract::EventExtractor;
use crate::filter::{self, DateFilterConfig, FilterOutcome};
use crate::loader::{ConvergenceLoader, RetryLedger, Termination};
use crate::metrics::ensure_metrics_described;
use crate::model::EventRecord;
use crate::port::{PageInteractionPort, PortResult};
use crate::selector::pause;

fn default_approaches() -> Vec<String> {
    vec!["https://www.facebook.com/events/search/?q={city}".to_string()]
}
fn default_link_pattern() -> String {
    "/events/".to_string()
}
fn default_settle_ms() -> u64 {
    3_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// URL templates; `{city}` is replaced by the city name. Approach ids are
    /// 1-based positions in this list.
    #[serde(default = "default_approaches")]
    pub approaches: Vec<String>,
    /// Substring an anchor href must contain to count as an event link.
    #[serde(default = "default_link_pattern")]
    pub link_pattern: String,
    /// Wait after navigation, and again before loading starts.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default)]
    pub date_filter: DateFilterConfig,
    #[serde(default)]
    pub cities: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            approaches: default_approaches(),
            link_pattern: default_link_pattern(),
            settle_ms: default_settle_ms(),
            date_filter: DateFilterConfig::default(),
            cities: Vec::new(),
        }
    }
}

pub fn search_url(template: &str, city: &str) -> String {
    template.replace("{city}", city.trim())
}

/// What happened to one search approach.
#[derive(Debug, Clone)]
pub struct ApproachSummary {
    pub id: u32,
    pub url: String,
    pub filter: Option<FilterOutcome>,
    pub termination: Option<Termination>,
    pub links_seen: usize,
    pub extracted: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScrapeRun {
    pub city: String,
    /// Deduplicated and ranked.
    pub records: Vec<EventRecord>,
    pub approaches: Vec<ApproachSummary>,
    pub elapsed_ms: u64,
    /// Set when the page port went away mid-run; `records` is then empty.
    pub aborted: Option<String>,
}

pub struct EventsScraper<'a, P: PageInteractionPort + ?Sized> {
    port: &'a P,
    cfg: &'a ScraperConfig,
}

impl<'a, P: PageInteractionPort + ?Sized> EventsScraper<'a, P> {
    pub fn new(port: &'a P, cfg: &'a ScraperConfig) -> Self {
        Self { port, cfg }
    }

    /// Run every approach for `city`. Only an unavailable port is an error;
    /// a failing approach is logged and skipped.
    pub async fn search_and_extract(&self, city: &str) -> PortResult<ScrapeRun> {
        ensure_metrics_described();
        let t0 = Instant::now();
        let mut ledger = RetryLedger::new();
        let mut collected = Vec::new();
        let mut approaches = Vec::with_capacity(self.cfg.search.approaches.len());

        tracing::info!(target: "scraper", %city, approaches = self.cfg.search.approaches.len(), "search started");

        for (i, template) in self.cfg.search.approaches.iter().enumerate() {
            let id = (i + 1) as u32;
            let url = search_url(template, city);
            match self.run_approach(&url, city, id, &mut ledger, &mut collected).await {
                Ok(summary) => approaches.push(summary),
                Err(e) if e.is_unavailable() => return Err(e),
                Err(e) => {
                    tracing::warn!(target: "scraper", approach = id, %url, error = %e, "approach failed");
                    approaches.push(ApproachSummary {
                        id,
                        url,
                        filter: None,
                        termination: None,
                        links_seen: 0,
                        extracted: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let candidates = collected.len();
        let records = dedup::reduce(collected);
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        counter!("scrape_records_kept_total").increment(records.len() as u64);
        histogram!("scrape_run_ms").record(elapsed_ms as f64);
        tracing::info!(target: "scraper", %city, candidates, kept = records.len(), elapsed_ms, "search finished");

        Ok(ScrapeRun {
            city: city.to_string(),
            records,
            approaches,
            elapsed_ms,
            aborted: None,
        })
    }

    async fn run_approach(
        &self,
        url: &str,
        city: &str,
        id: u32,
        ledger: &mut RetryLedger,
        out: &mut Vec<EventRecord>,
    ) -> PortResult<ApproachSummary> {
        let settle = Duration::from_millis(self.cfg.search.settle_ms);
        tracing::info!(target: "scraper", approach = id, %url, "approach started");

        self.port.navigate(url).await?;
        pause(settle).await;

        let filter_outcome = filter::apply_this_week(
            self.port,
            &self.cfg.search.date_filter,
            &self.cfg.loader.activations,
        )
        .await?;
        pause(settle).await;

        let pattern = self.cfg.search.link_pattern.as_str();
        let outcome = ConvergenceLoader::new(&self.cfg.loader, ledger)
            .load(self.port, pattern)
            .await?;

        let extractor = EventExtractor::new(&self.cfg.extract);
        let before = out.len();
        out.extend(
            outcome
                .links
                .iter()
                .take(self.cfg.extract.max_events_to_process)
                .enumerate()
                .filter_map(|(i, link)| extractor.extract(&link.href, &link.text, city, id, i)),
        );
        let extracted = out.len() - before;

        tracing::info!(
            target: "scraper",
            approach = id,
            filter = ?filter_outcome,
            links = outcome.links.len(),
            extracted,
            "approach finished"
        );

        Ok(ApproachSummary {
            id,
            url: url.to_string(),
            filter: Some(filter_outcome),
            termination: Some(outcome.termination),
            links_seen: outcome.links.len(),
            extracted,
            error: None,
        })
    }
}

/// Scrape `cities` one after another. A city whose port went away yields an
/// aborted run with no records; the next city still runs.
pub async fn scrape_cities<P: PageInteractionPort + ?Sized>(
    port: &P,
    cfg: &ScraperConfig,
    cities: &[String],
) -> Vec<ScrapeRun> {
    let scraper = EventsScraper::new(port, cfg);
    let mut runs = Vec::with_capacity(cities.len());
    for city in cities {
        match scraper.search_and_extract(city).await {
            Ok(run) => runs.push(run),
            Err(e) => {
                tracing::error!(target: "scraper", %city, error = %e, "run aborted");
                runs.push(ScrapeRun {
                    city: city.clone(),
                    records: Vec::new(),
                    approaches: Vec::new(),
                    elapsed_ms: 0,
                    aborted: Some(e.to_string()),
                });
            }
        }
    }
    runs
}
