// src/loader/mod.rs
//! Convergence loader: keep asking an infinite-scroll page for more links
//! until it stops producing them.
//!
//! Per cycle: scroll, wait, count. No growth bumps the stable counter and
//! tries the "load more" controls; once the counter reaches the threshold the
//! remediation tactics run. When those fail too the loader has converged.
//! Both convergence and the cycle cap return the best snapshot, never an error.
//! Only [`PortError::Unavailable`](crate::port::PortError) escapes.

pub mod buttons;
pub mod ledger;
pub mod remediation;

use std::collections::HashMap;
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::port::{recover, PageInteractionPort, PortResult, RenderedLink};
use crate::selector::{pause, Activation, MatcherKind, DEFAULT_ACTIVATIONS};

pub use ledger::RetryLedger;
pub use remediation::Remediation;

pub const DEFAULT_MAX_CYCLES: usize = 20;
pub const DEFAULT_STABLE_THRESHOLD: usize = 2;
pub const DEFAULT_CYCLE_PAUSE_MS: u64 = 5_000;

const DEFAULT_LOAD_MORE_LABELS: &[&str] = &[
    "see more",
    "load more",
    "show more",
    "more events",
    "view more",
    "see all",
    "show all",
    "meer weergeven",
    "load more events",
    "show more events",
    "view all events",
];

const DEFAULT_SKIP_PHRASES: &[&str] = &[
    "see more on facebook",
    "view on facebook",
    "go to facebook",
];

fn default_max_cycles() -> usize {
    DEFAULT_MAX_CYCLES
}
fn default_stable_threshold() -> usize {
    DEFAULT_STABLE_THRESHOLD
}
fn default_cycle_pause_ms() -> u64 {
    DEFAULT_CYCLE_PAUSE_MS
}
fn default_pre_click_pause_ms() -> u64 {
    1_000
}
fn default_click_settle_ms() -> u64 {
    3_000
}
fn default_load_more_labels() -> Vec<String> {
    DEFAULT_LOAD_MORE_LABELS.iter().map(|s| s.to_string()).collect()
}
fn default_skip_phrases() -> Vec<String> {
    DEFAULT_SKIP_PHRASES.iter().map(|s| s.to_string()).collect()
}
fn default_button_kinds() -> Vec<MatcherKind> {
    vec![MatcherKind::Button, MatcherKind::Link, MatcherKind::Text]
}
fn default_activations() -> Vec<Activation> {
    DEFAULT_ACTIVATIONS.to_vec()
}

/// Tunables for one loading session. Thresholds are empirical, hence config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_max_cycles")]
    pub max_cycles: usize,
    #[serde(default = "default_cycle_pause_ms")]
    pub cycle_pause_ms: u64,
    #[serde(default = "default_stable_threshold")]
    pub stable_threshold: usize,
    #[serde(default = "default_load_more_labels")]
    pub load_more_labels: Vec<String>,
    #[serde(default = "default_skip_phrases")]
    pub skip_phrases: Vec<String>,
    #[serde(default = "default_button_kinds")]
    pub button_kinds: Vec<MatcherKind>,
    #[serde(default = "default_activations")]
    pub activations: Vec<Activation>,
    #[serde(default = "default_pre_click_pause_ms")]
    pub pre_click_pause_ms: u64,
    #[serde(default = "default_click_settle_ms")]
    pub click_settle_ms: u64,
    #[serde(default = "remediation::default_tactics")]
    pub remediation: Vec<Remediation>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_cycles: default_max_cycles(),
            cycle_pause_ms: default_cycle_pause_ms(),
            stable_threshold: default_stable_threshold(),
            load_more_labels: default_load_more_labels(),
            skip_phrases: default_skip_phrases(),
            button_kinds: default_button_kinds(),
            activations: default_activations(),
            pre_click_pause_ms: default_pre_click_pause_ms(),
            click_settle_ms: default_click_settle_ms(),
            remediation: remediation::default_tactics(),
        }
    }
}

impl LoaderConfig {
    /// Same tactics and labels, no waiting. Handy for replayed sessions and tests.
    pub fn without_pauses(mut self) -> Self {
        self.cycle_pause_ms = 0;
        self.pre_click_pause_ms = 0;
        self.click_settle_ms = 0;
        for tactic in &mut self.remediation {
            match tactic {
                Remediation::MicroScrolls {
                    pause_ms,
                    settle_ms,
                    ..
                }
                | Remediation::ScrollReversal {
                    pause_ms,
                    settle_ms,
                    ..
                } => {
                    *pause_ms = 0;
                    *settle_ms = 0;
                }
                Remediation::EndKey { settle_ms } => *settle_ms = 0,
            }
        }
        self
    }

    /// Clamp values that would make the loop meaningless.
    pub fn sanitized(mut self) -> Self {
        if self.max_cycles == 0 {
            self.max_cycles = 1;
        }
        if self.stable_threshold == 0 {
            self.stable_threshold = 1;
        }
        if self.activations.is_empty() {
            self.activations = default_activations();
        }
        self
    }

    pub fn cycle_pause(&self) -> Duration {
        Duration::from_millis(self.cycle_pause_ms)
    }
}

/// Where the loop stands after the latest cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Growing,
    Stable(usize),
    Remediating,
    Converged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every remediation tactic failed.
    Converged,
    /// Ran out of cycles.
    MaxCycles,
}

/// Transient loop state, owned by one `load` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadState {
    pub last_observed_count: usize,
    pub stable_cycles: usize,
    pub attempted_advanced_techniques: bool,
}

impl LoadState {
    pub fn starting_at(count: usize) -> Self {
        Self {
            last_observed_count: count,
            ..Self::default()
        }
    }

    /// Something (scroll, click, remediation) produced `count` links.
    /// Returns whether that was growth; growth resets the stable counter.
    pub fn observe(&mut self, count: usize) -> bool {
        let grew = count > self.last_observed_count;
        if grew {
            self.stable_cycles = 0;
        } else {
            self.stable_cycles += 1;
        }
        self.last_observed_count = count;
        grew
    }

    /// An intervention pushed the count to `count`.
    pub fn reset_to(&mut self, count: usize) {
        self.last_observed_count = count;
        self.stable_cycles = 0;
    }

    pub fn phase(&self, threshold: usize) -> LoadPhase {
        match self.stable_cycles {
            0 => LoadPhase::Growing,
            n if n < threshold => LoadPhase::Stable(n),
            _ => LoadPhase::Remediating,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub links: Vec<RenderedLink>,
    pub cycles: usize,
    pub initial_count: usize,
    pub final_count: usize,
    pub termination: Termination,
    pub attempted_advanced_techniques: bool,
}

pub struct ConvergenceLoader<'a> {
    cfg: &'a LoaderConfig,
    ledger: &'a mut RetryLedger,
}

impl<'a> ConvergenceLoader<'a> {
    pub fn new(cfg: &'a LoaderConfig, ledger: &'a mut RetryLedger) -> Self {
        Self { cfg, ledger }
    }

    pub async fn load<P: PageInteractionPort + ?Sized>(
        &mut self,
        port: &P,
        pattern: &str,
    ) -> PortResult<LoadOutcome> {
        let entry = recover(port.rendered_links(pattern).await, Vec::new())?;
        let mut state = LoadState::starting_at(entry.len());
        let mut termination = Termination::MaxCycles;
        let mut cycles = 0;
        let threshold = self.cfg.stable_threshold.max(1);

        tracing::info!(target: "loader", port = port.name(), initial = entry.len(), "loading started");

        for cycle in 1..=self.cfg.max_cycles.max(1) {
            cycles = cycle;
            counter!("loader_cycles_total").increment(1);

            recover(port.trigger_scroll().await, ())?;
            pause(self.cfg.cycle_pause()).await;

            let baseline = state.last_observed_count;
            let count = recover(port.current_link_count(pattern).await, baseline)?;
            if state.observe(count) {
                tracing::debug!(target: "loader", cycle, added = count - baseline, total = count, "growing");
                continue;
            }
            tracing::debug!(target: "loader", cycle, stable = state.stable_cycles, total = count, "no new content");

            if let Some(n) =
                buttons::click_load_more(port, self.cfg, self.ledger, pattern, count).await?
            {
                state.reset_to(n);
                continue;
            }

            if state.phase(threshold) != LoadPhase::Remediating {
                continue;
            }

            state.attempted_advanced_techniques = true;
            match remediation::run_tactics(port, &self.cfg.remediation, pattern, count).await? {
                Some(n) => state.reset_to(n),
                None => {
                    tracing::info!(target: "loader", cycle, total = count, "converged");
                    termination = Termination::Converged;
                    break;
                }
            }
        }

        let last = recover(port.rendered_links(pattern).await, Vec::new())?;
        let links = merge_snapshots(&entry, last);

        tracing::info!(
            target: "loader",
            cycles,
            ?termination,
            initial = entry.len(),
            collected = links.len(),
            ledger = self.ledger.len(),
            "loading finished"
        );

        Ok(LoadOutcome {
            initial_count: entry.len(),
            final_count: links.len(),
            links,
            cycles,
            termination,
            attempted_advanced_techniques: state.attempted_advanced_techniques,
        })
    }
}

/// Final snapshot plus whatever was visible at entry and has since been
/// recycled out of a virtualized list. Multiset union, so the result is never
/// shorter than `entry`.
pub fn merge_snapshots(entry: &[RenderedLink], last: Vec<RenderedLink>) -> Vec<RenderedLink> {
    let mut remaining: HashMap<&RenderedLink, usize> = HashMap::new();
    for link in &last {
        *remaining.entry(link).or_default() += 1;
    }

    let mut missing = Vec::new();
    for link in entry {
        match remaining.get_mut(link) {
            Some(n) if *n > 0 => *n -= 1,
            _ => missing.push(link.clone()),
        }
    }

    let mut out = last;
    out.extend(missing);
    out
}
