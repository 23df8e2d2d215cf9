// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod compare;
pub mod config;
pub mod dedup;
pub mod extract;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod port;
pub mod scraper;
pub mod selector;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::{load_config_default, ScraperConfig};
pub use crate::dedup::reduce;
pub use crate::extract::{EventExtractor, ExtractConfig};
pub use crate::loader::{ConvergenceLoader, LoaderConfig, RetryLedger};
pub use crate::model::{EventRecord, ScrapeReport, Urgency};
pub use crate::port::{PageInteractionPort, PortError, PortResult, RenderedLink};
pub use crate::scraper::{scrape_cities, EventsScraper, ScrapeRun};
