use std::{collections::HashMap, fs};

use super::*;

#[test]
fn defaults_point_at_local_service() {
    let settings = Settings::default();
    assert_eq!(settings.api_base_url, "http://localhost:8081");
    settings.validate().expect("defaults are valid");
}

#[test]
fn explicit_config_file_overrides_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("desk.toml");
    fs::write(
        &path,
        "api_base_url = \"https://stages.example.org/api\"\nrequest_timeout_secs = 30\n",
    )
    .expect("write config");

    let mut settings = Settings::default();
    let raw = fs::read_to_string(&path).expect("read");
    apply_file(&mut settings, toml::from_str(&raw).expect("parse"));

    assert_eq!(settings.api_base_url, "https://stages.example.org/api");
    assert_eq!(settings.request_timeout_secs, 30);
    assert_eq!(settings.storage_url, Settings::default().storage_url);
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(load_settings(Some(dir.path().join("absent.toml").as_path())).is_err());
}

#[test]
fn app_prefixed_env_wins_over_short_names() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("STAGE_DESK_API_URL", "http://short:1"),
        ("APP__API_BASE_URL", "http://app:2"),
        ("STAGE_DESK_STORAGE_URL", "sqlite::memory:"),
        ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
    ]);
    let mut settings = Settings::default();
    apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.api_base_url, "http://app:2");
    assert_eq!(settings.storage_url, "sqlite::memory:");
    assert_eq!(settings.request_timeout_secs, 15);
}

#[test]
fn cli_overrides_apply_last() {
    let settings = Settings::default()
        .with_overrides(Some("http://cli:9".into()), None);
    assert_eq!(settings.api_base_url, "http://cli:9");
    assert_eq!(settings.storage_url, Settings::default().storage_url);
}

#[test]
fn rejects_non_http_api_urls_and_zero_timeout() {
    let mut settings = Settings::default();
    settings.api_base_url = "ftp://files.example.org".into();
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.request_timeout_secs = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_storage_url("./data/desk.db"),
        "sqlite://./data/desk.db"
    );
    assert_eq!(
        normalize_storage_url("sqlite:C:\\Users\\sara\\desk.db"),
        "sqlite://C:/Users/sara/desk.db"
    );
    assert_eq!(normalize_storage_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(normalize_storage_url("  "), Settings::default().storage_url);
}
