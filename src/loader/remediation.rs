// src/loader/remediation.rs
//! Fallback interactions tried once plain scrolling and buttons stall.

use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::port::{recover, PageInteractionPort, PortResult, Scroll};
use crate::selector::pause;

/// A remediation tactic. Each one is judged on its own against the count
/// observed before remediation started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tactic", rename_all = "snake_case")]
pub enum Remediation {
    /// A burst of short relative scrolls.
    MicroScrolls {
        count: u32,
        step_px: i64,
        pause_ms: u64,
        settle_ms: u64,
    },
    /// Scroll up a little, then back to the bottom, to re-trigger lazy loading.
    ScrollReversal {
        up_px: i64,
        pause_ms: u64,
        settle_ms: u64,
    },
    /// "End of document" key press.
    EndKey { settle_ms: u64 },
}

impl Remediation {
    pub fn name(&self) -> &'static str {
        match self {
            Remediation::MicroScrolls { .. } => "micro_scrolls",
            Remediation::ScrollReversal { .. } => "scroll_reversal",
            Remediation::EndKey { .. } => "end_key",
        }
    }

    async fn apply<P: PageInteractionPort + ?Sized>(&self, port: &P) -> PortResult<()> {
        match *self {
            Remediation::MicroScrolls {
                count,
                step_px,
                pause_ms,
                settle_ms,
            } => {
                for _ in 0..count {
                    recover(port.scroll(Scroll::By(step_px)).await, ())?;
                    pause(Duration::from_millis(pause_ms)).await;
                }
                pause(Duration::from_millis(settle_ms)).await;
            }
            Remediation::ScrollReversal {
                up_px,
                pause_ms,
                settle_ms,
            } => {
                recover(port.scroll(Scroll::By(-up_px.abs())).await, ())?;
                pause(Duration::from_millis(pause_ms)).await;
                recover(port.scroll(Scroll::ToBottom).await, ())?;
                pause(Duration::from_millis(settle_ms)).await;
            }
            Remediation::EndKey { settle_ms } => {
                recover(port.scroll(Scroll::EndKey).await, ())?;
                pause(Duration::from_millis(settle_ms)).await;
            }
        }
        Ok(())
    }
}

pub fn default_tactics() -> Vec<Remediation> {
    vec![
        Remediation::MicroScrolls {
            count: 3,
            step_px: 800,
            pause_ms: 300,
            settle_ms: 2_000,
        },
        Remediation::ScrollReversal {
            up_px: 300,
            pause_ms: 1_000,
            settle_ms: 2_000,
        },
        Remediation::EndKey { settle_ms: 3_000 },
    ]
}

/// Try `tactics` in order. Returns the new count from the first tactic that
/// pushed the count above `baseline`, or `None` when all of them failed.
pub async fn run_tactics<P: PageInteractionPort + ?Sized>(
    port: &P,
    tactics: &[Remediation],
    pattern: &str,
    baseline: usize,
) -> PortResult<Option<usize>> {
    for tactic in tactics {
        counter!("loader_remediation_total", "tactic" => tactic.name()).increment(1);
        tactic.apply(port).await?;

        let count = recover(port.current_link_count(pattern).await, baseline)?;
        if count > baseline {
            tracing::info!(
                target: "loader",
                tactic = tactic.name(),
                before = baseline,
                after = count,
                "remediation worked"
            );
            return Ok(Some(count));
        }
        tracing::debug!(target: "loader", tactic = tactic.name(), "remediation found nothing");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tactics_deserialize_from_tagged_toml() {
        #[derive(Deserialize)]
        struct W {
            t: Vec<Remediation>,
        }
        let w: W = toml::from_str(
            r#"
t = [
  { tactic = "end_key", settle_ms = 10 },
  { tactic = "micro_scrolls", count = 2, step_px = 400, pause_ms = 0, settle_ms = 0 },
]
"#,
        )
        .unwrap();
        assert_eq!(w.t[0], Remediation::EndKey { settle_ms: 10 });
        assert_eq!(w.t[1].name(), "micro_scrolls");
    }

    #[test]
    fn defaults_cover_all_three_tactics_in_order() {
        let names: Vec<_> = default_tactics().iter().map(Remediation::name).collect();
        assert_eq!(names, ["micro_scrolls", "scroll_reversal", "end_key"]);
    }
}
