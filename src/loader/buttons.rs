// src/loader/buttons.rs
//! "Load more" button sub-protocol.

use std::time::Duration;

use metrics::counter;

use crate::loader::ledger::RetryLedger;
use crate::loader::LoaderConfig;
use crate::port::{recover, PageElement, PageInteractionPort, PortResult};
use crate::selector::{activate_with_fallbacks, normalize_label, pause, Matcher};

fn is_skipped(label: &str, skip_phrases: &[String]) -> bool {
    skip_phrases
        .iter()
        .any(|skip| label.contains(&skip.to_lowercase()))
}

/// Try every candidate control once. Returns the new link count as soon as a
/// click grows the list past `baseline`; `None` when nothing helped.
///
/// Controls that were activated without effect, or could not be activated,
/// are written to `ledger` and skipped for the rest of the run.
pub async fn click_load_more<P: PageInteractionPort + ?Sized>(
    port: &P,
    cfg: &LoaderConfig,
    ledger: &mut RetryLedger,
    pattern: &str,
    baseline: usize,
) -> PortResult<Option<usize>> {
    for phrase in &cfg.load_more_labels {
        for &kind in &cfg.button_kinds {
            let matcher = Matcher::new(kind, phrase.as_str());
            let elements = recover(port.find_elements(&matcher).await, Vec::new())?;

            for el in elements {
                if !eligible(&el, &matcher, cfg, ledger) {
                    continue;
                }
                if let Some(count) = try_control(port, cfg, ledger, &el, pattern, baseline).await? {
                    return Ok(Some(count));
                }
            }
        }
    }
    Ok(None)
}

fn eligible(el: &PageElement, matcher: &Matcher, cfg: &LoaderConfig, ledger: &RetryLedger) -> bool {
    if !el.is_interactable() || !matcher.accepts(&el.label) {
        return false;
    }
    if is_skipped(&normalize_label(&el.label), &cfg.skip_phrases) {
        return false;
    }
    !ledger.is_failed(el)
}

async fn try_control<P: PageInteractionPort + ?Sized>(
    port: &P,
    cfg: &LoaderConfig,
    ledger: &mut RetryLedger,
    el: &PageElement,
    pattern: &str,
    baseline: usize,
) -> PortResult<Option<usize>> {
    tracing::debug!(target: "loader", label = %el.label, "trying load-more control");
    counter!("loader_button_clicks_total").increment(1);

    recover(port.scroll_into_view(el).await, ())?;
    pause(Duration::from_millis(cfg.pre_click_pause_ms)).await;

    if !activate_with_fallbacks(port, el, &cfg.activations).await? {
        tracing::debug!(target: "loader", label = %el.label, "could not activate, marking failed");
        ledger.record_failure(el);
        return Ok(None);
    }

    pause(Duration::from_millis(cfg.click_settle_ms)).await;
    let count = recover(port.current_link_count(pattern).await, baseline)?;
    if count > baseline {
        tracing::info!(target: "loader", label = %el.label, before = baseline, after = count, "load-more worked");
        return Ok(Some(count));
    }

    tracing::debug!(target: "loader", label = %el.label, "no new content, marking failed");
    ledger.record_failure(el);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_phrases_match_inside_labels() {
        let skip = vec!["see more on facebook".to_string()];
        assert!(is_skipped("click to see more on facebook now", &skip));
        assert!(!is_skipped("see more", &skip));
    }
}
