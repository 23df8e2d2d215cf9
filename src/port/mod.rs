// src/port/mod.rs
//! The page capability the pipeline runs against.
//!
//! Everything browser-shaped (driver sessions, login, selectors) lives behind
//! [`PageInteractionPort`]. The loader, the date filter and the scraper only
//! ever talk to this trait, one awaited call at a time.

pub mod replay;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selector::{Activation, Matcher};

pub type PortResult<T> = std::result::Result<T, PortError>;

#[derive(Debug, Error)]
pub enum PortError {
    /// The collaborator cannot be reached at all. Aborts the run.
    #[error("page port unavailable: {0}")]
    Unavailable(String),

    /// A single interaction did not go through. Always recovered locally.
    #[error("interaction failed: {0}")]
    Interaction(String),
}

impl PortError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PortError::Unavailable(_))
    }
}

/// Swallow interaction failures, keep hard failures.
pub(crate) fn recover<T>(res: PortResult<T>, fallback: T) -> PortResult<T> {
    match res {
        Ok(v) => Ok(v),
        Err(PortError::Interaction(msg)) => {
            tracing::debug!(target: "port", %msg, "interaction failed, continuing");
            Ok(fallback)
        }
        Err(e) => Err(e),
    }
}

/// One anchor currently rendered on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderedLink {
    pub href: String,
    pub text: String,
}

impl RenderedLink {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// Approximate on-screen position of an element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Handle to an interactive element found by a [`Matcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageElement {
    /// Collaborator-specific id, passed back on activation.
    pub id: String,
    /// Visible label text.
    pub label: String,
    pub position: Position,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default = "yes")]
    pub enabled: bool,
    /// Checked/selected state for toggles (checkboxes, filter chips).
    #[serde(default)]
    pub selected: bool,
}

fn yes() -> bool {
    true
}

impl PageElement {
    pub fn is_interactable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Viewport movements the loader can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// Jump to the bottom of the document.
    ToBottom,
    /// Relative scroll; negative values scroll up.
    By(i64),
    /// Send an "end of document" key press.
    EndKey,
}

#[async_trait]
pub trait PageInteractionPort: Send + Sync {
    /// Load a page.
    async fn navigate(&self, url: &str) -> PortResult<()>;

    /// Snapshot of anchors whose href contains `pattern`. No side effects.
    async fn rendered_links(&self, pattern: &str) -> PortResult<Vec<RenderedLink>>;

    /// Cheap count of anchors whose href contains `pattern`.
    async fn current_link_count(&self, pattern: &str) -> PortResult<usize>;

    async fn scroll(&self, scroll: Scroll) -> PortResult<()>;

    /// Advance the viewport; safe to call repeatedly.
    async fn trigger_scroll(&self) -> PortResult<()> {
        self.scroll(Scroll::ToBottom).await
    }

    /// Elements matching one `(kind, pattern)` lookup.
    async fn find_elements(&self, matcher: &Matcher) -> PortResult<Vec<PageElement>>;

    async fn scroll_into_view(&self, element: &PageElement) -> PortResult<()>;

    /// Try to interact with `element` using one technique. `Ok(false)` means the
    /// element refused the interaction.
    async fn activate(&self, element: &PageElement, technique: Activation) -> PortResult<bool>;

    fn name(&self) -> &str;
}
