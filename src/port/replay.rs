// src/port/replay.rs
//! A [`PageInteractionPort`] that plays back a recorded search session.
//!
//! The recording lists, per search URL, every event link the page would ever
//! show and how they trickle in: some are visible right away, some appear on
//! each bottom scroll, some only after a working "See more" control. This is
//! enough to drive the whole pipeline offline.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{PageElement, PageInteractionPort, PortError, PortResult, RenderedLink, Scroll};
use crate::selector::{Activation, Matcher, MatcherKind};

/// Page url used when no recorded page matches exactly.
const ANY_URL: &str = "*";

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayControl {
    pub kind: MatcherKind,
    #[serde(flatten)]
    pub element: PageElement,
    /// Links revealed each time the control is activated.
    #[serde(default)]
    pub reveals: usize,
    /// Techniques the control responds to. Empty means all.
    #[serde(default)]
    pub accepts: Vec<Activation>,
}

impl ReplayControl {
    fn responds_to(&self, technique: Activation) -> bool {
        self.accepts.is_empty() || self.accepts.contains(&technique)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayPage {
    pub url: String,
    #[serde(default)]
    pub links: Vec<RenderedLink>,
    #[serde(default)]
    pub initially_visible: usize,
    /// Links revealed by a jump to the bottom.
    #[serde(default)]
    pub per_scroll: usize,
    /// Links revealed by small relative scrolls and the end key.
    #[serde(default)]
    pub per_nudge: usize,
    #[serde(default)]
    pub controls: Vec<ReplayControl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaySession {
    pub pages: Vec<ReplayPage>,
}

#[derive(Debug, Default)]
struct Cursor {
    page: Option<usize>,
    visible: usize,
    controls: Vec<ReplayControl>,
}

pub struct ReplayPort {
    session: ReplaySession,
    cursor: Mutex<Cursor>,
}

impl ReplayPort {
    pub fn new(session: ReplaySession) -> Self {
        Self {
            session,
            cursor: Mutex::new(Cursor::default()),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let session: ReplaySession = serde_json::from_str(s).context("parsing replay session")?;
        Ok(Self::new(session))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading replay session from {}", path.display()))?;
        Self::from_json_str(&content)
    }

    fn cursor(&self) -> PortResult<MutexGuard<'_, Cursor>> {
        self.cursor
            .lock()
            .map_err(|_| PortError::Unavailable("replay cursor poisoned".into()))
    }

    fn current<'s>(&'s self, cursor: &Cursor) -> PortResult<&'s ReplayPage> {
        cursor
            .page
            .map(|i| &self.session.pages[i])
            .ok_or_else(|| PortError::Interaction("no page loaded".into()))
    }

    fn reveal(&self, cursor: &mut Cursor, n: usize) -> PortResult<()> {
        let total = self.current(cursor)?.links.len();
        cursor.visible = (cursor.visible + n).min(total);
        Ok(())
    }
}

#[async_trait]
impl PageInteractionPort for ReplayPort {
    async fn navigate(&self, url: &str) -> PortResult<()> {
        let idx = self
            .session
            .pages
            .iter()
            .position(|p| p.url == url)
            .or_else(|| self.session.pages.iter().position(|p| p.url == ANY_URL))
            .ok_or_else(|| PortError::Interaction(format!("no recorded page for {url}")))?;

        let page = &self.session.pages[idx];
        let mut cursor = self.cursor()?;
        cursor.page = Some(idx);
        cursor.visible = page.initially_visible.min(page.links.len());
        cursor.controls = page.controls.clone();
        tracing::debug!(target: "replay", %url, visible = cursor.visible, total = page.links.len(), "page loaded");
        Ok(())
    }

    async fn rendered_links(&self, pattern: &str) -> PortResult<Vec<RenderedLink>> {
        let cursor = self.cursor()?;
        let page = self.current(&cursor)?;
        Ok(page.links[..cursor.visible]
            .iter()
            .filter(|l| l.href.contains(pattern))
            .cloned()
            .collect())
    }

    async fn current_link_count(&self, pattern: &str) -> PortResult<usize> {
        let cursor = self.cursor()?;
        let page = self.current(&cursor)?;
        Ok(page.links[..cursor.visible]
            .iter()
            .filter(|l| l.href.contains(pattern))
            .count())
    }

    async fn scroll(&self, scroll: Scroll) -> PortResult<()> {
        let mut cursor = self.cursor()?;
        let page = self.current(&cursor)?;
        let n = match scroll {
            Scroll::ToBottom => page.per_scroll,
            Scroll::By(px) if px > 0 => page.per_nudge,
            Scroll::By(_) => 0,
            Scroll::EndKey => page.per_nudge,
        };
        self.reveal(&mut cursor, n)
    }

    async fn find_elements(&self, matcher: &Matcher) -> PortResult<Vec<PageElement>> {
        let cursor = self.cursor()?;
        Ok(cursor
            .controls
            .iter()
            .filter(|c| c.kind == matcher.kind && matcher.accepts(&c.element.label))
            .map(|c| c.element.clone())
            .collect())
    }

    async fn scroll_into_view(&self, _element: &PageElement) -> PortResult<()> {
        Ok(())
    }

    async fn activate(&self, element: &PageElement, technique: Activation) -> PortResult<bool> {
        let mut cursor = self.cursor()?;
        let Some(i) = cursor.controls.iter().position(|c| c.element.id == element.id) else {
            return Err(PortError::Interaction(format!("stale element {}", element.id)));
        };
        if !cursor.controls[i].responds_to(technique) {
            return Ok(false);
        }

        let reveals = cursor.controls[i].reveals;
        if matches!(cursor.controls[i].kind, MatcherKind::Checkbox) {
            cursor.controls[i].element.selected = true;
        }
        self.reveal(&mut cursor, reveals)?;
        Ok(true)
    }

    fn name(&self) -> &str {
        "replay"
    }
}
