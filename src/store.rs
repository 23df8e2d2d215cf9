// src/store.rs
//! One JSON file per city, overwritten by every run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::model::ScrapeReport;

const FALLBACK_CITY: &str = "Unknown_City";

/// `facebook_events_<clean city>.json`
pub fn events_filename(city: &str) -> String {
    static RE_STRIP: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let strip = RE_STRIP.get_or_init(|| Regex::new(r"[^\w\s-]").unwrap());
    let ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());

    let clean = strip.replace_all(city.trim(), "");
    let clean = ws.replace_all(&clean, "_");
    let clean = clean.trim_matches('_');
    let clean = if clean.is_empty() { FALLBACK_CITY } else { clean };
    format!("facebook_events_{clean}.json")
}

pub fn report_path(dir: &Path, city: &str) -> PathBuf {
    dir.join(events_filename(city))
}

/// Write `report` as pretty JSON, replacing the previous run for that city.
pub fn save_report(dir: &Path, report: &ScrapeReport) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating output dir {}", dir.display()))?;
    let path = report_path(dir, &report.city);
    let existed = path.exists();

    let body = serde_json::to_string_pretty(report).context("serializing report")?;
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;

    if existed {
        tracing::info!(target: "store", path = %path.display(), events = report.total_events, "replaced previous run");
    } else {
        tracing::info!(target: "store", path = %path.display(), events = report.total_events, "created");
    }
    Ok(path)
}

/// Previous run for `city`, if one was saved.
pub fn load_report(dir: &Path, city: &str) -> Result<Option<ScrapeReport>> {
    let path = report_path(dir, city);
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let report = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(report))
}
