// src/selector.rs
//! Abstract element lookups and the small interpreter that walks them.
//!
//! A lookup is a `(kind, pattern)` pair. Ordered lists of lookups replace the
//! dozens of hand-written selector fallbacks a browser script tends to grow:
//! the list is evaluated front to back and the first hit wins.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::port::{recover, PageElement, PageInteractionPort, PortResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    Button,
    Link,
    /// Any element whose own text node contains the pattern.
    Text,
    Checkbox,
    Label,
    AriaLabel,
}

impl MatcherKind {
    fn as_str(&self) -> &'static str {
        match self {
            MatcherKind::Button => "button",
            MatcherKind::Link => "link",
            MatcherKind::Text => "text",
            MatcherKind::Checkbox => "checkbox",
            MatcherKind::Label => "label",
            MatcherKind::AriaLabel => "aria_label",
        }
    }
}

/// One abstract lookup. `pattern` is matched case-insensitively as a substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matcher {
    pub kind: MatcherKind,
    pub pattern: String,
}

impl Matcher {
    pub fn new(kind: MatcherKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
        }
    }

    /// Does `label` satisfy this lookup?
    pub fn accepts(&self, label: &str) -> bool {
        normalize_label(label).contains(&self.pattern.to_lowercase())
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.pattern)
    }
}

/// Ways of interacting with an element, tried in order until one works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Direct,
    Scripted,
    ScrollThenActivate,
}

pub const DEFAULT_ACTIVATIONS: [Activation; 3] = [
    Activation::Direct,
    Activation::Scripted,
    Activation::ScrollThenActivate,
];

/// Lower-case, trim and fold internal whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Run `techniques` in order; `Ok(true)` on the first success.
///
/// Interaction failures count as "this technique did not work".
pub async fn activate_with_fallbacks<P: PageInteractionPort + ?Sized>(
    port: &P,
    element: &PageElement,
    techniques: &[Activation],
) -> PortResult<bool> {
    for &technique in techniques {
        if recover(port.activate(element, technique).await, false)? {
            tracing::trace!(target: "selector", label = %element.label, ?technique, "activated");
            return Ok(true);
        }
    }
    Ok(false)
}

/// Walk `matchers` in priority order and return the first visible element.
pub async fn first_visible<P: PageInteractionPort + ?Sized>(
    port: &P,
    matchers: &[Matcher],
) -> PortResult<Option<(usize, PageElement)>> {
    for (i, matcher) in matchers.iter().enumerate() {
        let found = recover(port.find_elements(matcher).await, Vec::new())?;
        if let Some(el) = found.into_iter().find(|el| el.visible) {
            tracing::debug!(target: "selector", %matcher, priority = i, "lookup hit");
            return Ok(Some((i, el)));
        }
    }
    Ok(None)
}

pub(crate) async fn pause(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_ws() {
        assert_eq!(normalize_label("  See\n   MORE  "), "see more");
        assert_eq!(normalize_label(""), "");
    }

    #[test]
    fn matcher_is_case_insensitive_substring() {
        let m = Matcher::new(MatcherKind::Button, "Load More");
        assert!(m.accepts("LOAD MORE EVENTS"));
        assert!(!m.accepts("load"));
    }

    #[test]
    fn matcher_roundtrips_through_toml() {
        #[derive(Deserialize)]
        struct W {
            m: Vec<Matcher>,
        }
        let w: W = toml::from_str(
            r#"m = [{ kind = "aria_label", pattern = "This week" }, { kind = "text", pattern = "x" }]"#,
        )
        .unwrap();
        assert_eq!(w.m[0].kind, MatcherKind::AriaLabel);
        assert_eq!(w.m[1].to_string(), "text:x");
    }
}
