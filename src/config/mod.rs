// src/config/mod.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::extract::ExtractConfig;
use crate::loader::LoaderConfig;
use crate::scraper::SearchConfig;

pub const ENV_CONFIG_PATH: &str = "SCRAPER_CONFIG_PATH";
pub const ENV_CITIES: &str = "SCRAPER_CITIES";
const DEFAULT_TOML_PATH: &str = "config/scraper.toml";
const DEFAULT_JSON_PATH: &str = "config/scraper.json";
pub const DEFAULT_CITY: &str = "Timișoara";

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ScraperConfig {
    fn sanitized(mut self) -> Self {
        self.loader = self.loader.sanitized();
        if self.extract.title_max_chars == 0 {
            self.extract.title_max_chars = ExtractConfig::default().title_max_chars;
        }
        if self.search.link_pattern.trim().is_empty() {
            self.search.link_pattern = SearchConfig::default().link_pattern;
        }
        self.search.cities = clean_cities(self.search.cities);
        self
    }
}

/// Load config from an explicit path. TOML or JSON, picked by extension.
pub fn load_config_from(path: &Path) -> Result<ScraperConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading scraper config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing scraper config {}", path.display()))
}

/// Resolve config:
/// 1) $SCRAPER_CONFIG_PATH (must exist)
/// 2) config/scraper.toml
/// 3) config/scraper.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<ScraperConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    tracing::debug!(target: "config", "no config file found, using defaults");
    Ok(ScraperConfig::default().sanitized())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<ScraperConfig> {
    let cfg: ScraperConfig = if hint_ext == "json" {
        serde_json::from_str(s)?
    } else {
        toml::from_str(s)?
    };
    Ok(cfg.sanitized())
}

/// Cities to scrape: `$SCRAPER_CITIES` (comma separated) wins over the config
/// list; with neither set, [`DEFAULT_CITY`].
pub fn resolve_cities(cfg: &ScraperConfig) -> Vec<String> {
    let from_env = std::env::var(ENV_CITIES)
        .map(|raw| clean_cities(raw.split(',').map(str::to_string).collect()))
        .unwrap_or_default();
    if !from_env.is_empty() {
        return from_env;
    }
    if !cfg.search.cities.is_empty() {
        return cfg.search.cities.clone();
    }
    vec![DEFAULT_CITY.to_string()]
}

/// Trim, drop empties, drop repeats (case-insensitive), keep order.
fn clean_cities(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_lowercase()) {
            out.push(t.to_string());
        }
    }
    out
}
