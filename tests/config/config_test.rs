//! Coverage for config parsing and loading.

use std::path::{Path, PathBuf};

use folio::config::{load_config, load_or_default, ChatConfig, Config, OpenAiConfig};

#[test]
fn default_sections_match_documented_values() {
    let config = Config::default();
    assert!(config.p13n.enabled);
    assert_eq!(config.p13n.cache_prefix, "p13n");
    assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
    assert_eq!(config.openai.model, "gpt-4o-mini");
    assert_eq!(
        config.openai.base_url,
        "https://api.openai.com/v1/chat/completions"
    );
    assert_eq!(config.chat.max_requests, 20);
    assert_eq!(config.chat.window_seconds, 900);
    assert_eq!(config.analytics.max_events_per_minute, 60);
}

#[test]
fn parse_full_config() {
    let toml_str = r#"
[p13n]
enabled = false
cache_prefix = "blog"
database = "/var/lib/folio/cache.db"

[openai]
api_key_env = "FOLIO_OPENAI_KEY"
model = "gpt-4o"
base_url = "http://localhost:8080/v1/chat/completions"

[chat]
max_requests = 5
window_seconds = 60

[analytics]
max_events_per_minute = 120
"#;
    let config = match toml::from_str::<Config>(toml_str) {
        Ok(config) => config,
        Err(err) => panic!("full config should parse: {err}"),
    };
    assert!(!config.p13n.enabled);
    assert_eq!(config.p13n.cache_prefix, "blog");
    assert_eq!(
        config.p13n.database.as_deref(),
        Some(Path::new("/var/lib/folio/cache.db"))
    );
    assert_eq!(config.openai.api_key_env, "FOLIO_OPENAI_KEY");
    assert_eq!(config.openai.model, "gpt-4o");
    assert_eq!(config.chat.max_requests, 5);
    assert_eq!(config.chat.window_seconds, 60);
    assert_eq!(config.analytics.max_events_per_minute, 120);
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = match toml::from_str::<Config>("[chat]\nmax_requests = 3\n") {
        Ok(config) => config,
        Err(err) => panic!("partial config should parse: {err}"),
    };
    assert_eq!(config.chat.max_requests, 3);
    assert_eq!(config.chat.window_seconds, ChatConfig::default().window_seconds);
    assert!(config.p13n.enabled);
}

#[test]
fn database_path_prefers_configured_value() {
    let mut config = Config::default();
    config.p13n.database = Some(PathBuf::from("/tmp/folio-test.db"));
    let path = config.p13n.database_path().expect("configured path");
    assert_eq!(path, PathBuf::from("/tmp/folio-test.db"));
}

#[test]
fn database_path_defaults_under_config_dir() {
    let path = Config::default()
        .p13n
        .database_path()
        .expect("home directory should resolve");
    assert!(path.ends_with(".folio/p13n.db"));
}

#[test]
fn load_config_reads_file() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[p13n]\ncache_prefix = \"from-file\"\n").expect("write config");

    let config = load_config(&path).expect("config should load");
    assert_eq!(config.p13n.cache_prefix, "from-file");
}

#[test]
fn load_config_reports_missing_file() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let err = load_config(&tmp.path().join("absent.toml")).expect_err("missing file should fail");
    assert!(err.to_string().contains("failed to read config"));
}

#[test]
fn load_or_default_tolerates_missing_file() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let config = load_or_default(&tmp.path().join("absent.toml")).expect("defaults");
    assert_eq!(config.p13n.cache_prefix, "p13n");
}

#[test]
fn load_or_default_rejects_invalid_toml() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[p13n\nenabled = ").expect("write config");

    let err = load_or_default(&path).expect_err("invalid TOML should fail");
    assert!(err.to_string().contains("failed to parse config"));
}

#[test]
fn api_key_comes_from_named_env_var() {
    let var = "FOLIO_CONFIG_TEST_API_KEY";
    let config = OpenAiConfig {
        api_key_env: var.to_owned(),
        ..OpenAiConfig::default()
    };

    std::env::remove_var(var);
    assert!(config.api_key().is_none());

    std::env::set_var(var, "   ");
    assert!(config.api_key().is_none());

    std::env::set_var(var, "sk-from-env");
    assert_eq!(config.api_key().as_deref(), Some("sk-from-env"));
    std::env::remove_var(var);
}
