mod common;
use common::ENV_LOCK;

use adsbridge::services::settings::Settings;

const KEYS: &[&str] = &[
    "META_ACCESS_TOKEN",
    "META_API_VERSION",
    "ADS_IMAGE_HOSTS",
    "ADS_RETRY_MAX_ATTEMPTS",
    "ADS_DATA_URL_MAX_BYTES",
    "IMGBB_API_KEY",
];

fn snapshot() -> Vec<(&'static str, Option<String>)> {
    KEYS.iter().map(|k| (*k, std::env::var(k).ok())).collect()
}

fn restore(saved: Vec<(&'static str, Option<String>)>) {
    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

#[tokio::test]
async fn settings_read_environment_overrides() {
    let _guard = ENV_LOCK.lock().await;
    let saved = snapshot();

    std::env::set_var("META_ACCESS_TOKEN", "  EAAenvtoken  ");
    std::env::set_var("META_API_VERSION", "20.0");
    std::env::set_var("ADS_IMAGE_HOSTS", "catbox, 0x0");
    std::env::set_var("ADS_RETRY_MAX_ATTEMPTS", "0");
    std::env::set_var("ADS_DATA_URL_MAX_BYTES", "1024");
    std::env::set_var("IMGBB_API_KEY", "imgbb-secret");

    let settings = Settings::from_env();
    assert_eq!(settings.access_token.as_deref(), Some("EAAenvtoken"));
    assert_eq!(settings.api_version, "v20.0");
    assert_eq!(settings.image_hosts, vec!["catbox", "0x0"]);
    assert_eq!(settings.retry_max_attempts, 1);
    assert_eq!(settings.data_url_max_bytes, 1024);
    assert!(settings.secrets().contains(&"imgbb-secret".to_string()));

    restore(saved);
}

#[tokio::test]
async fn blank_values_fall_back_to_defaults() {
    let _guard = ENV_LOCK.lock().await;
    let saved = snapshot();

    for key in KEYS {
        std::env::set_var(key, "   ");
    }
    let settings = Settings::from_env();
    let defaults = Settings::default();
    assert!(settings.access_token.is_none());
    assert_eq!(settings.api_version, defaults.api_version);
    assert_eq!(settings.image_hosts, vec!["imgbb", "catbox"]);
    assert_eq!(settings.retry_max_attempts, defaults.retry_max_attempts);

    restore(saved);
}
