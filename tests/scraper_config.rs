// tests/scraper_config.rs
use events_scraper::config::{
    load_config_default, load_config_from, resolve_cities, ENV_CITIES, ENV_CONFIG_PATH,
};
use events_scraper::loader::Remediation;
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("scraper.toml");
    fs::write(
        &p_toml,
        r#"
[loader]
stable_threshold = 3

[[loader.remediation]]
tactic = "end_key"
settle_ms = 0

[search]
approaches = ["https://m.facebook.com/events/search/?q={city}", "https://www.facebook.com/events/search/?q={city}"]
"#,
    )
    .unwrap();
    let c = load_config_from(&p_toml).unwrap();
    assert_eq!(c.loader.stable_threshold, 3);
    assert_eq!(c.loader.max_cycles, 20);
    assert_eq!(c.loader.remediation, vec![Remediation::EndKey { settle_ms: 0 }]);
    assert_eq!(c.search.approaches.len(), 2);

    let p_json = dir.path().join("scraper.json");
    fs::write(&p_json, r#"{"output": {"dir": "runs"}, "search": {"cities": ["Arad"]}}"#).unwrap();
    let cj = load_config_from(&p_json).unwrap();
    assert_eq!(cj.output.dir, std::path::PathBuf::from("runs"));
    assert_eq!(cj.search.cities, vec!["Arad".to_string()]);
    assert_eq!(cj.loader.remediation.len(), 3);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var(ENV_CONFIG_PATH);

    // 1) Nothing on disk: built-in defaults
    let c = load_config_default().unwrap();
    assert_eq!(c.loader.max_cycles, 20);
    assert_eq!(c.loader.cycle_pause_ms, 5_000);

    // 2) config/scraper.json
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("scraper.json"), r#"{"loader": {"max_cycles": 7}}"#).unwrap();
    assert_eq!(load_config_default().unwrap().loader.max_cycles, 7);

    // 3) TOML wins over JSON
    fs::write(cfg_dir.join("scraper.toml"), "[loader]\nmax_cycles = 9\n").unwrap();
    assert_eq!(load_config_default().unwrap().loader.max_cycles, 9);

    // 4) env path wins over both
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, "[loader]\nmax_cycles = 11\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(load_config_default().unwrap().loader.max_cycles, 11);

    // 5) env path to nowhere is an error, not a silent fallback
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(load_config_default().is_err());
    env::remove_var(ENV_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn cities_from_env_then_config_then_default() {
    let mut cfg = events_scraper::ScraperConfig::default();

    env::remove_var(ENV_CITIES);
    assert_eq!(resolve_cities(&cfg), vec!["Timișoara".to_string()]);

    cfg.search.cities = vec!["Arad".into()];
    assert_eq!(resolve_cities(&cfg), vec!["Arad".to_string()]);

    env::set_var(ENV_CITIES, " Cluj-Napoca , ,Oradea,cluj-napoca");
    assert_eq!(
        resolve_cities(&cfg),
        vec!["Cluj-Napoca".to_string(), "Oradea".to_string()]
    );

    env::set_var(ENV_CITIES, " , ");
    assert_eq!(resolve_cities(&cfg), vec!["Arad".to_string()]);
    env::remove_var(ENV_CITIES);
}
