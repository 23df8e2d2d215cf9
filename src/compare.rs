// src/compare.rs
use std::collections::HashSet;

use serde::Serialize;

use crate::model::ScrapeReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    More,
    Fewer,
    Same,
}

/// How this run differs from the last saved one for the same city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunComparison {
    pub previous_total: usize,
    pub current_total: usize,
    pub delta: i64,
    pub trend: Trend,
    /// Links present now but not last time, in current order.
    pub new_links: Vec<String>,
    /// Links from last time that are gone, in previous order.
    pub dropped_links: Vec<String>,
}

pub fn compare_runs(previous: &ScrapeReport, current: &ScrapeReport) -> RunComparison {
    let prev: HashSet<&str> = previous.events.iter().map(|e| e.link.as_str()).collect();
    let cur: HashSet<&str> = current.events.iter().map(|e| e.link.as_str()).collect();

    let new_links = current
        .events
        .iter()
        .filter(|e| !prev.contains(e.link.as_str()))
        .map(|e| e.link.clone())
        .collect();
    let dropped_links = previous
        .events
        .iter()
        .filter(|e| !cur.contains(e.link.as_str()))
        .map(|e| e.link.clone())
        .collect();

    let delta = current.total_events as i64 - previous.total_events as i64;
    let trend = match delta {
        d if d > 0 => Trend::More,
        d if d < 0 => Trend::Fewer,
        _ => Trend::Same,
    };

    RunComparison {
        previous_total: previous.total_events,
        current_total: current.total_events,
        delta,
        trend,
        new_links,
        dropped_links,
    }
}
