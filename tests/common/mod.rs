#![allow(dead_code)]

use adsbridge::services::graph_client::GraphClient;
use adsbridge::services::logger::{LogLevel, Logger};
use adsbridge::services::settings::Settings;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const TOKEN: &str = "EAAtesttoken";

/// Settings aimed at a local mock server, with retries fast enough for tests.
pub fn mock_settings(base_url: &str) -> Settings {
    Settings {
        access_token: Some(TOKEN.to_string()),
        graph_base_url: base_url.to_string(),
        gemini_base_url: base_url.to_string(),
        imgbb_upload_url: format!("{}/imgbb", base_url),
        catbox_upload_url: format!("{}/catbox", base_url),
        null_pointer_upload_url: format!("{}/0x0", base_url),
        retry_base_delay_ms: 5,
        http_timeout_ms: 5_000,
        ..Settings::default()
    }
}

pub fn quiet_logger() -> Logger {
    Logger::new("test").with_level(LogLevel::Error)
}

pub fn graph_client(settings: Settings) -> Arc<GraphClient> {
    Arc::new(GraphClient::new(quiet_logger(), Arc::new(settings)).unwrap())
}
