// src/dedup.rs
//! Merge candidates from every pass, drop duplicates, rank what is left.

use std::collections::HashSet;

use metrics::counter;

use crate::model::{EventRecord, Urgency};

/// Characters of the lower-cased title that feed the fingerprint.
const FINGERPRINT_PREFIX_CHARS: usize = 70;
/// Fingerprints this short are too generic to prove anything.
const MIN_FINGERPRINT_CHARS: usize = 10;

/// Alphanumerics of the first 70 chars of the lower-cased title.
pub fn fingerprint(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .take(FINGERPRINT_PREFIX_CHARS)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

pub fn relevance_score(rec: &EventRecord) -> u32 {
    let mut score = 0;
    if rec.city_match {
        score += 100;
    }
    score += match rec.urgency {
        Some(Urgency::Today) => 50,
        Some(Urgency::Tomorrow) => 25,
        Some(Urgency::ThisWeek) => 15,
        None => 0,
    };
    if rec.date_time.as_deref().is_some_and(|d| !d.is_empty()) {
        score += 10;
    }
    score
}

/// Seen-sets for one scraping run. First record seen wins.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen_links: HashSet<String>,
    seen_fingerprints: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `rec` as seen. `false` when it duplicates an earlier record by
    /// link, or by a fingerprint long enough to be meaningful.
    pub fn admit(&mut self, rec: &EventRecord) -> bool {
        let fp = fingerprint(&rec.title);
        let long_fp = fp.chars().count() > MIN_FINGERPRINT_CHARS;

        let dup_link = !rec.link.is_empty() && self.seen_links.contains(&rec.link);
        let dup_title = long_fp && self.seen_fingerprints.contains(&fp);
        if dup_link || dup_title {
            return false;
        }

        if !rec.link.is_empty() {
            self.seen_links.insert(rec.link.clone());
        }
        if long_fp {
            self.seen_fingerprints.insert(fp);
        }
        true
    }

    /// Keep the admitted records, then order by score, best first. Ties keep
    /// their arrival order.
    pub fn reduce(&mut self, records: Vec<EventRecord>) -> Vec<EventRecord> {
        let before = records.len();
        let mut kept: Vec<EventRecord> = records.into_iter().filter(|r| self.admit(r)).collect();
        kept.sort_by_key(|r| std::cmp::Reverse(relevance_score(r)));

        let removed = before - kept.len();
        if removed > 0 {
            tracing::debug!(target: "dedup", before, kept = kept.len(), removed, "duplicates removed");
            counter!("dedup_removed_total").increment(removed as u64);
        }
        kept
    }
}

/// One-shot reduce with fresh seen-sets.
pub fn reduce(records: Vec<EventRecord>) -> Vec<EventRecord> {
    Deduplicator::new().reduce(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(title: &str, link: &str) -> EventRecord {
        EventRecord {
            title: title.into(),
            link: link.into(),
            date_time: None,
            location: None,
            city_match: false,
            source_approach: 1,
            urgency: None,
        }
    }

    #[test]
    fn fingerprint_keeps_alphanumerics_of_prefix() {
        assert_eq!(fingerprint("Live Jazz Night!"), "livejazznight");
        assert_eq!(fingerprint(&"ab ".repeat(40)).chars().count(), 47);
        assert_eq!(fingerprint("Târg de Crăciun"), "târgdecrăciun");
    }

    #[test]
    fn same_link_different_text_drops_second() {
        let out = reduce(vec![
            rec("Live Jazz Night", "https://fb/events/1/"),
            rec("Completely different", "https://fb/events/1/"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Live Jazz Night");
    }

    #[test]
    fn long_fingerprint_collision_drops_short_does_not() {
        let out = reduce(vec![
            rec("Live Jazz Night", "https://fb/events/1/"),
            rec("LIVE jazz night!!", "https://fb/events/2/"),
            rec("Party", "https://fb/events/3/"),
            rec("party", "https://fb/events/4/"),
        ]);
        let links: Vec<_> = out.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            ["https://fb/events/1/", "https://fb/events/3/", "https://fb/events/4/"]
        );
    }

    #[test]
    fn ranking_is_stable_and_descending() {
        let mut a = rec("Plain one", "https://fb/events/1/");
        a.date_time = Some("Sat".into());
        let mut b = rec("City match", "https://fb/events/2/");
        b.city_match = true;
        let mut c = rec("Today thing", "https://fb/events/3/");
        c.urgency = Some(Urgency::Today);
        let d = rec("Nothing", "https://fb/events/4/");
        let e = rec("Nothing two", "https://fb/events/5/");

        let out = reduce(vec![a, d, b, e, c]);
        let titles: Vec<_> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            ["City match", "Today thing", "Plain one", "Nothing", "Nothing two"]
        );
    }

    #[test]
    fn score_weights() {
        let mut r = rec("x", "l");
        r.city_match = true;
        r.urgency = Some(Urgency::Tomorrow);
        r.date_time = Some("Fri".into());
        assert_eq!(relevance_score(&r), 135);
        r.date_time = Some(String::new());
        r.urgency = Some(Urgency::ThisWeek);
        assert_eq!(relevance_score(&r), 115);
    }

    #[test]
    fn seen_sets_span_calls() {
        let mut d = Deduplicator::new();
        assert_eq!(d.reduce(vec![rec("Open air cinema", "https://fb/events/1/")]).len(), 1);
        assert!(d.reduce(vec![rec("Open air cinema", "https://fb/events/9/")]).is_empty());
    }
}
