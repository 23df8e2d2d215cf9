// src/extract/mod.rs
//! Turn one rendered `(href, visible text)` pair into an [`EventRecord`].
//!
//! Pure: the same input always gives the same record or the same rejection.

pub mod rules;

use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::model::{EventRecord, Urgency};
use rules::parse_lines;

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Events root, discovery/explore pages or a navigation label.
    Navigation,
    /// Href does not look like a single event page.
    NotAnEvent,
    /// Visible text too short to carry anything.
    TooShort,
}

impl Rejection {
    fn as_str(&self) -> &'static str {
        match self {
            Rejection::Navigation => "navigation",
            Rejection::NotAnEvent => "not_an_event",
            Rejection::TooShort => "too_short",
        }
    }
}

fn default_events_root() -> String {
    "https://www.facebook.com/events/".to_string()
}
fn default_event_path() -> String {
    "facebook.com/events/".to_string()
}
fn default_navigation_paths() -> Vec<String> {
    ["events/?acontext", "events/discovery", "events/explore"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_navigation_labels() -> Vec<String> {
    ["events", "discover", "explore", "create event", "home", "feed"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_min_path_components() -> usize {
    5
}
fn default_min_text_chars() -> usize {
    5
}
fn default_title_max_chars() -> usize {
    120
}
fn default_max_events_to_process() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_events_root")]
    pub events_root: String,
    /// Substring every event href must contain.
    #[serde(default = "default_event_path")]
    pub event_path: String,
    #[serde(default = "default_navigation_paths")]
    pub navigation_paths: Vec<String>,
    #[serde(default = "default_navigation_labels")]
    pub navigation_labels: Vec<String>,
    /// Minimum number of `/`-separated pieces in an event href.
    #[serde(default = "default_min_path_components")]
    pub min_path_components: usize,
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
    /// Cap on links handed to the extractor per approach.
    #[serde(default = "default_max_events_to_process")]
    pub max_events_to_process: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            events_root: default_events_root(),
            event_path: default_event_path(),
            navigation_paths: default_navigation_paths(),
            navigation_labels: default_navigation_labels(),
            min_path_components: default_min_path_components(),
            min_text_chars: default_min_text_chars(),
            title_max_chars: default_title_max_chars(),
            max_events_to_process: default_max_events_to_process(),
        }
    }
}

/// Decode entities and non-breaking spaces that leak into visible text.
pub fn normalize_visible_text(s: &str) -> String {
    html_escape::decode_html_entities(s)
        .replace('\u{00A0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Cut to `max` characters, snapping back to the last whitespace inside the
/// limit when there is one, and append `...`.
pub fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let head: String = title.chars().take(max).collect();
    match head.rfind(char::is_whitespace) {
        Some(i) if i > 0 => format!("{}...", head[..i].trim_end()),
        _ => format!("{head}..."),
    }
}

pub struct EventExtractor<'a> {
    cfg: &'a ExtractConfig,
}

impl<'a> EventExtractor<'a> {
    pub fn new(cfg: &'a ExtractConfig) -> Self {
        Self { cfg }
    }

    fn screen(&self, href: &str, text: &str) -> Result<(), Rejection> {
        let label = text.trim().to_lowercase();
        if href == self.cfg.events_root
            || self.cfg.navigation_paths.iter().any(|p| href.contains(p.as_str()))
            || self
                .cfg
                .navigation_labels
                .iter()
                .any(|l| l.trim().to_lowercase() == label)
        {
            return Err(Rejection::Navigation);
        }
        if !href.contains(self.cfg.event_path.as_str())
            || href.split('/').count() < self.cfg.min_path_components
        {
            return Err(Rejection::NotAnEvent);
        }
        if text.trim().chars().count() < self.cfg.min_text_chars {
            return Err(Rejection::TooShort);
        }
        Ok(())
    }

    /// Build a record or say why not.
    pub fn classify(
        &self,
        href: &str,
        text: &str,
        city: &str,
        approach: u32,
        index: usize,
    ) -> Result<EventRecord, Rejection> {
        let text = normalize_visible_text(text);
        let href = href.trim();

        if index < 10 || index % 20 == 0 {
            tracing::trace!(target: "extract", index, %href, "candidate");
        }
        self.screen(href, &text)?;

        let parsed = parse_lines(&text);
        let title = if parsed.title.is_empty() {
            text.lines().next().unwrap_or_default().trim().to_string()
        } else {
            parsed.title
        };

        let lower = text.to_lowercase();
        // An empty city is contained in every text.
        let city_match = lower.contains(&city.trim().to_lowercase());
        let location = parsed.location.or_else(|| {
            (city_match && !city.trim().is_empty()).then(|| format!("Near {}", city.trim()))
        });

        Ok(EventRecord {
            title: truncate_title(&title, self.cfg.title_max_chars),
            link: href.to_string(),
            date_time: parsed.date_time,
            location,
            city_match,
            source_approach: approach,
            urgency: Urgency::detect(&lower),
        })
    }

    pub fn extract(
        &self,
        href: &str,
        text: &str,
        city: &str,
        approach: u32,
        index: usize,
    ) -> Option<EventRecord> {
        counter!("extract_candidates_total").increment(1);
        match self.classify(href, text, city, approach, index) {
            Ok(rec) => Some(rec),
            Err(why) => {
                counter!("extract_rejected_total", "reason" => why.as_str()).increment(1);
                None
            }
        }
    }
}
