// src/filter.rs
//! The optional "This week" date filter on the search page.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::port::{PageInteractionPort, PortResult};
use crate::selector::{activate_with_fallbacks, first_visible, pause, Activation, Matcher, MatcherKind};

fn default_matchers() -> Vec<Matcher> {
    vec![
        Matcher::new(MatcherKind::Checkbox, "this week"),
        Matcher::new(MatcherKind::Label, "this week"),
        Matcher::new(MatcherKind::AriaLabel, "this week"),
        Matcher::new(MatcherKind::Text, "this week"),
    ]
}
fn default_settle_ms() -> u64 {
    3_000
}
fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateFilterConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lookups in priority order; first visible hit wins.
    #[serde(default = "default_matchers")]
    pub matchers: Vec<Matcher>,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for DateFilterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            matchers: default_matchers(),
            settle_ms: default_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Was already on.
    AlreadySelected,
    Applied,
    /// No control found, or none of the techniques worked.
    NotApplied,
    Disabled,
}

impl FilterOutcome {
    pub fn is_active(&self) -> bool {
        matches!(self, FilterOutcome::AlreadySelected | FilterOutcome::Applied)
    }
}

/// Turn the filter on if the page offers it. Missing controls are not an error.
pub async fn apply_this_week<P: PageInteractionPort + ?Sized>(
    port: &P,
    cfg: &DateFilterConfig,
    activations: &[Activation],
) -> PortResult<FilterOutcome> {
    if !cfg.enabled {
        return Ok(FilterOutcome::Disabled);
    }

    let Some((priority, el)) = first_visible(port, &cfg.matchers).await? else {
        tracing::info!(target: "filter", "no date filter control, continuing without");
        return Ok(FilterOutcome::NotApplied);
    };

    if el.selected {
        tracing::debug!(target: "filter", priority, "date filter already selected");
        return Ok(FilterOutcome::AlreadySelected);
    }

    if activate_with_fallbacks(port, &el, activations).await? {
        pause(Duration::from_millis(cfg.settle_ms)).await;
        tracing::info!(target: "filter", priority, label = %el.label, "date filter applied");
        Ok(FilterOutcome::Applied)
    } else {
        tracing::warn!(target: "filter", label = %el.label, "date filter control did not respond");
        Ok(FilterOutcome::NotApplied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{PageElement, PortError, Position, RenderedLink, Scroll};
    use crate::selector::DEFAULT_ACTIVATIONS;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// One "This week" control; records every activation attempt.
    struct ChipPage {
        chip: Option<PageElement>,
        accepts: Vec<Activation>,
        attempts: Mutex<Vec<Activation>>,
    }

    impl ChipPage {
        fn new(selected: bool, accepts: &[Activation]) -> Self {
            Self {
                chip: Some(PageElement {
                    id: "week".into(),
                    label: "This week".into(),
                    position: Position { x: 40, y: 120 },
                    visible: true,
                    enabled: true,
                    selected,
                }),
                accepts: accepts.to_vec(),
                attempts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageInteractionPort for ChipPage {
        async fn navigate(&self, _url: &str) -> PortResult<()> {
            Ok(())
        }
        async fn rendered_links(&self, _pattern: &str) -> PortResult<Vec<RenderedLink>> {
            Ok(Vec::new())
        }
        async fn current_link_count(&self, _pattern: &str) -> PortResult<usize> {
            Ok(0)
        }
        async fn scroll(&self, _scroll: Scroll) -> PortResult<()> {
            Ok(())
        }
        async fn find_elements(&self, matcher: &Matcher) -> PortResult<Vec<PageElement>> {
            Ok(self
                .chip
                .iter()
                .filter(|el| matcher.accepts(&el.label))
                .cloned()
                .collect())
        }
        async fn scroll_into_view(&self, _element: &PageElement) -> PortResult<()> {
            Ok(())
        }
        async fn activate(&self, _element: &PageElement, technique: Activation) -> PortResult<bool> {
            self.attempts.lock().push(technique);
            if technique == Activation::Direct && !self.accepts.contains(&technique) {
                return Err(PortError::Interaction("element click intercepted".into()));
            }
            Ok(self.accepts.contains(&technique))
        }
        fn name(&self) -> &str {
            "chip-page"
        }
    }

    fn quick() -> DateFilterConfig {
        DateFilterConfig {
            settle_ms: 0,
            ..DateFilterConfig::default()
        }
    }

    #[tokio::test]
    async fn selected_chip_is_left_alone() {
        let page = ChipPage::new(true, &DEFAULT_ACTIVATIONS);
        let out = apply_this_week(&page, &quick(), &DEFAULT_ACTIVATIONS).await.unwrap();
        assert_eq!(out, FilterOutcome::AlreadySelected);
        assert!(out.is_active());
        assert!(page.attempts.lock().is_empty());
    }

    #[tokio::test]
    async fn disabled_filter_never_looks_at_the_page() {
        let page = ChipPage::new(false, &DEFAULT_ACTIVATIONS);
        let cfg = DateFilterConfig {
            enabled: false,
            ..quick()
        };
        let out = apply_this_week(&page, &cfg, &DEFAULT_ACTIVATIONS).await.unwrap();
        assert_eq!(out, FilterOutcome::Disabled);
        assert!(!out.is_active());
        assert!(page.attempts.lock().is_empty());
    }

    #[tokio::test]
    async fn chip_refusing_every_technique_is_not_applied() {
        let page = ChipPage::new(false, &[]);
        let out = apply_this_week(&page, &quick(), &DEFAULT_ACTIVATIONS).await.unwrap();
        assert_eq!(out, FilterOutcome::NotApplied);
        assert_eq!(*page.attempts.lock(), DEFAULT_ACTIVATIONS.to_vec());
    }

    #[tokio::test]
    async fn later_technique_applies_the_filter() {
        let page = ChipPage::new(false, &[Activation::Scripted]);
        let out = apply_this_week(&page, &quick(), &DEFAULT_ACTIVATIONS).await.unwrap();
        assert_eq!(out, FilterOutcome::Applied);
        assert_eq!(
            *page.attempts.lock(),
            vec![Activation::Direct, Activation::Scripted]
        );
    }

    #[tokio::test]
    async fn page_without_chip_is_not_applied() {
        let mut page = ChipPage::new(false, &DEFAULT_ACTIVATIONS);
        page.chip = None;
        let out = apply_this_week(&page, &quick(), &DEFAULT_ACTIVATIONS).await.unwrap();
        assert_eq!(out, FilterOutcome::NotApplied);
        assert!(page.attempts.lock().is_empty());
    }
}
