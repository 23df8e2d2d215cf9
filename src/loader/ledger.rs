// src/loader/ledger.rs
//! Remembers "load more" controls that were tried and did not help.

use std::collections::HashSet;

use crate::port::{PageElement, Position};
use crate::selector::normalize_label;

/// Grid used to make positions approximate; layout jitter of a few pixels
/// should not turn a known-dead button into a new one.
const POSITION_GRID_PX: i64 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub label: String,
    pub position: Position,
}

impl LedgerKey {
    pub fn for_element(el: &PageElement) -> Self {
        Self {
            label: normalize_label(&el.label),
            position: Position {
                x: el.position.x.div_euclid(POSITION_GRID_PX),
                y: el.position.y.div_euclid(POSITION_GRID_PX),
            },
        }
    }
}

/// Append-only within a run. Create a fresh one per scraping run.
#[derive(Debug, Default)]
pub struct RetryLedger {
    failed: HashSet<LedgerKey>,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, el: &PageElement) {
        self.failed.insert(LedgerKey::for_element(el));
    }

    pub fn is_failed(&self, el: &PageElement) -> bool {
        self.failed.contains(&LedgerKey::for_element(el))
    }

    pub fn len(&self) -> usize {
        self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }
}
