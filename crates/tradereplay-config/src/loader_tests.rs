use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_empty_config() {
    let config = ConfigLoader::load_str("").unwrap();
    assert_eq!(config.server.port, 8787);
    assert_eq!(config.coordinator.screenshot_capacity, 50);
    assert_eq!(config.agent.base_delay_ms, 2000);
    assert_eq!(config.agent.growth_factor, 1.5);
    assert_eq!(config.agent.max_delay_ms, 30_000);
    assert_eq!(config.agent.max_attempts, 10);
    assert_eq!(config.backend.poll_interval_secs, 5);
    assert!(!config.backend.is_configured());
}

#[test]
fn test_load_sections() {
    let content = r#"
        [server]
        port = 9100

        [coordinator]
        badge_clear_ms = 1000
        supported_hosts = ["tradingview.com"]

        [agent]
        max_attempts = 3

        [backend]
        base_url = "https://demo.supabase.co"
        anon_key = "anon"
    "#;
    let config = ConfigLoader::load_str(content).unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.coordinator.badge_clear_ms, 1000);
    assert_eq!(config.coordinator.supported_hosts, vec!["tradingview.com"]);
    assert_eq!(config.agent.max_attempts, 3);
    assert!(config.backend.is_configured());
    assert_eq!(config.backend.bucket, "trade-recordings");
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[server]").unwrap();
    writeln!(file, "port = 5000").unwrap();

    let config = ConfigLoader::load(file.path()).unwrap();
    assert_eq!(config.server.port, 5000);
}

#[test]
fn test_load_nonexistent_file() {
    let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_load_or_default_missing_file() {
    let config = ConfigLoader::load_or_default(Path::new("/nonexistent/config.toml")).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn test_load_invalid_toml() {
    let result = ConfigLoader::load_str("invalid = [unclosed");
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_expand_env_vars() {
    // SAFETY: test-only variable name, not read by other tests
    unsafe {
        std::env::set_var("TRADEREPLAY_TEST_ANON_KEY", "anon-from-env");
    }
    let content = r#"
        [backend]
        anon_key = "${TRADEREPLAY_TEST_ANON_KEY}"
    "#;
    let config = ConfigLoader::load_str(content).unwrap();
    assert_eq!(config.backend.anon_key.as_deref(), Some("anon-from-env"));
    unsafe {
        std::env::remove_var("TRADEREPLAY_TEST_ANON_KEY");
    }
}

#[test]
fn test_expand_env_vars_not_set() {
    let content = "value = \"${TRADEREPLAY_NONEXISTENT_VAR_12345}\"";
    let result = ConfigLoader::expand_env_vars(content);
    assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
}

#[test]
fn test_data_dir_tilde_is_expanded() {
    let content = r#"
        [storage]
        data_dir = "~/trades"
    "#;
    let config = ConfigLoader::load_str(content).unwrap();
    assert!(!config.storage.data_dir.to_string_lossy().starts_with('~'));
    assert!(config.storage.data_dir.ends_with("trades"));
}

#[test]
fn test_to_toml_round_trips_defaults() {
    let rendered = ConfigLoader::to_toml(&Config::default()).unwrap();
    let config = ConfigLoader::load_str(&rendered).unwrap();
    assert_eq!(config.agent.max_attempts, 10);
}
