// src/model.rs
use serde::{Deserialize, Serialize};

/// Temporal proximity tag. Ranking only, not scheduling data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Today,
    Tomorrow,
    #[serde(rename = "This Week")]
    ThisWeek,
}

impl Urgency {
    /// Keyword scan of already lower-cased text; Today > Tomorrow > ThisWeek.
    pub fn detect(lower: &str) -> Option<Self> {
        if lower.contains("tonight") || lower.contains("today") {
            Some(Urgency::Today)
        } else if lower.contains("tomorrow") {
            Some(Urgency::Tomorrow)
        } else if lower.contains("this week") {
            Some(Urgency::ThisWeek)
        } else {
            None
        }
    }
}

/// One extracted event. Built once by the extractor, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Date/Time", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(rename = "Location", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "City_Match", default)]
    pub city_match: bool,
    #[serde(rename = "Source_Approach", default = "first_approach")]
    pub source_approach: u32,
    #[serde(rename = "Urgency", default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
}

fn first_approach() -> u32 {
    1
}

/// A finished run, in the shape written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub city: String,
    /// ISO-8601 local time of the run.
    pub timestamp: String,
    pub total_events: usize,
    pub events: Vec<EventRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraping_session: Option<ScrapingSession>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapingSession {
    pub date: String,
    pub time: String,
    pub filename: String,
}

impl ScrapeReport {
    pub fn new(city: &str, events: Vec<EventRecord>, now: chrono::DateTime<chrono::Local>) -> Self {
        Self {
            city: city.to_string(),
            timestamp: now.to_rfc3339(),
            total_events: events.len(),
            events,
            scraping_session: Some(ScrapingSession {
                date: now.format("%Y-%m-%d").to_string(),
                time: now.format("%H:%M:%S").to_string(),
                filename: crate::store::events_filename(city),
            }),
        }
    }
}
