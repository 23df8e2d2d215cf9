// tests/extract_records.rs
use events_scraper::extract::{EventExtractor, ExtractConfig};
use events_scraper::model::Urgency;

const CITY: &str = "Timișoara";

fn extractor_cfg() -> ExtractConfig {
    ExtractConfig::default()
}

#[test]
fn card_with_date_title_and_venue() {
    let cfg = extractor_cfg();
    let x = EventExtractor::new(&cfg);
    let rec = x
        .extract(
            "https://www.facebook.com/events/998877665544/",
            "Fri, 10 AM\nLive Jazz Night\nThe Blue Room, Main St",
            CITY,
            1,
            0,
        )
        .expect("record");

    assert_eq!(rec.title, "Live Jazz Night");
    assert!(rec.date_time.as_deref().unwrap().to_lowercase().contains("fri"));
    assert_eq!(rec.location.as_deref(), Some("The Blue Room, Main St"));
    assert_eq!(rec.source_approach, 1);
}

#[test]
fn bare_events_root_gives_nothing() {
    let cfg = extractor_cfg();
    let x = EventExtractor::new(&cfg);
    assert!(x
        .extract("https://www.facebook.com/events/", "Fri, 10 AM\nLive Jazz Night", CITY, 1, 0)
        .is_none());
}

#[test]
fn long_single_line_title_is_capped() {
    let cfg = extractor_cfg();
    let x = EventExtractor::new(&cfg);
    let rec = x
        .extract("https://www.facebook.com/events/1/2/", &"A".repeat(150), CITY, 2, 3)
        .unwrap();
    assert!(rec.title.chars().count() <= 123);
    assert!(rec.title.ends_with("..."));
    assert_eq!(rec.source_approach, 2);
}

#[test]
fn title_and_link_invariants_hold_for_kept_records() {
    let cfg = extractor_cfg();
    let x = EventExtractor::new(&cfg);
    let cases = [
        ("https://www.facebook.com/events/11/", "Today 19:00\nOpen Mic\nDock Pub, Timișoara"),
        ("https://www.facebook.com/events/12/", "   \n\nBook swap in the park\n"),
        ("https://www.facebook.com/events/13/", "Tomorrow"),
        ("https://www.facebook.com/events/14/", "Events"),
        ("https://www.facebook.com/events/explore/timisoara/", "Explore nearby"),
        ("https://www.facebook.com/pages/15/", "Some page name"),
    ];
    let kept: Vec<_> = cases
        .iter()
        .enumerate()
        .filter_map(|(i, (href, text))| x.extract(href, text, CITY, 1, i))
        .collect();

    assert_eq!(kept.len(), 3);
    for rec in &kept {
        assert!(!rec.title.is_empty());
        assert!(rec.link.contains("facebook.com/events/"));
        assert!(rec.link.split('/').count() >= 5);
    }
    assert_eq!(kept[0].urgency, Some(Urgency::Today));
    assert!(kept[0].city_match);
    assert_eq!(kept[1].title, "Book swap in the park");
    assert_eq!(kept[2].urgency, Some(Urgency::Tomorrow));
}

#[test]
fn configurable_thresholds_apply() {
    let cfg = ExtractConfig {
        min_text_chars: 20,
        title_max_chars: 10,
        ..ExtractConfig::default()
    };
    let x = EventExtractor::new(&cfg);
    assert!(x
        .extract("https://www.facebook.com/events/1/", "Short card", CITY, 1, 0)
        .is_none());
    let rec = x
        .extract("https://www.facebook.com/events/1/", "Harvest market and crafts fair", CITY, 1, 0)
        .unwrap();
    assert_eq!(rec.title, "Harvest...");
}
