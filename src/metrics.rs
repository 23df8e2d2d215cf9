// src/metrics.rs
//! Metric descriptions. Counters are no-ops until a recorder is installed.

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("loader_cycles_total", "Scroll/wait/count cycles run by the loader.");
        describe_counter!(
            "loader_button_clicks_total",
            "Load-more controls the loader tried."
        );
        describe_counter!(
            "loader_remediation_total",
            "Remediation tactics applied, by tactic."
        );
        describe_counter!(
            "extract_candidates_total",
            "Rendered links handed to the extractor."
        );
        describe_counter!(
            "extract_rejected_total",
            "Candidates discarded by the extractor, by reason."
        );
        describe_counter!(
            "dedup_removed_total",
            "Records removed as duplicates by link or title fingerprint."
        );
        describe_counter!(
            "scrape_records_kept_total",
            "Records kept at the end of a city run."
        );
        describe_histogram!("scrape_run_ms", "Wall time of one city run in milliseconds.");
    });
}
