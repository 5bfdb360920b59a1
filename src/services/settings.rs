use crate::constants::{gemini, graph, hosting, network, retry};
use crate::errors::ToolError;

/// Runtime configuration. Everything comes from the environment; `main`
/// may override a few fields from CLI flags before the app is built.
#[derive(Debug, Clone)]
pub struct Settings {
    pub access_token: Option<String>,
    pub api_version: String,
    pub graph_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_image_model: String,
    pub imgbb_api_key: Option<String>,
    pub imgbb_upload_url: String,
    pub catbox_upload_url: String,
    pub null_pointer_upload_url: String,
    pub image_hosts: Vec<String>,
    pub data_url_max_bytes: usize,
    pub http_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_token: None,
            api_version: graph::DEFAULT_API_VERSION.to_string(),
            graph_base_url: graph::DEFAULT_BASE_URL.to_string(),
            gemini_api_key: None,
            gemini_base_url: gemini::DEFAULT_BASE_URL.to_string(),
            gemini_image_model: gemini::DEFAULT_IMAGE_MODEL.to_string(),
            imgbb_api_key: None,
            imgbb_upload_url: hosting::IMGBB_UPLOAD_URL.to_string(),
            catbox_upload_url: hosting::CATBOX_UPLOAD_URL.to_string(),
            null_pointer_upload_url: hosting::NULL_POINTER_UPLOAD_URL.to_string(),
            image_hosts: hosting::DEFAULT_PROVIDERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            data_url_max_bytes: hosting::DATA_URL_MAX_BYTES,
            http_timeout_ms: network::TIMEOUT_HTTP_REQUEST_MS,
            retry_max_attempts: retry::MAX_ATTEMPTS,
            retry_base_delay_ms: retry::BASE_DELAY_MS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_token: env_string("META_ACCESS_TOKEN"),
            api_version: env_string("META_API_VERSION")
                .map(|v| normalize_api_version(&v))
                .unwrap_or(defaults.api_version),
            graph_base_url: env_string("META_GRAPH_BASE_URL").unwrap_or(defaults.graph_base_url),
            gemini_api_key: env_string("GEMINI_API_KEY"),
            gemini_base_url: env_string("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL")
                .unwrap_or(defaults.gemini_image_model),
            imgbb_api_key: env_string("IMGBB_API_KEY"),
            imgbb_upload_url: defaults.imgbb_upload_url,
            catbox_upload_url: defaults.catbox_upload_url,
            null_pointer_upload_url: defaults.null_pointer_upload_url,
            image_hosts: env_string("ADS_IMAGE_HOSTS")
                .map(|raw| parse_host_list(&raw))
                .unwrap_or(defaults.image_hosts),
            data_url_max_bytes: env_u64("ADS_DATA_URL_MAX_BYTES")
                .map(|v| v as usize)
                .unwrap_or(defaults.data_url_max_bytes),
            http_timeout_ms: env_u64("ADS_HTTP_TIMEOUT_MS").unwrap_or(defaults.http_timeout_ms),
            retry_max_attempts: env_u64("ADS_RETRY_MAX_ATTEMPTS")
                .map(|v| (v as usize).max(1))
                .unwrap_or(defaults.retry_max_attempts),
            retry_base_delay_ms: defaults.retry_base_delay_ms,
        }
    }

    pub fn require_access_token(&self) -> Result<&str, ToolError> {
        self.access_token
            .as_deref()
            .ok_or_else(|| ToolError::missing_credentials("META_ACCESS_TOKEN"))
    }

    pub fn graph_root(&self) -> String {
        format!(
            "{}/{}",
            self.graph_base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    /// Literal credential values, for verbatim masking in logs and errors.
    pub fn secrets(&self) -> Vec<String> {
        [
            self.access_token.as_ref(),
            self.gemini_api_key.as_ref(),
            self.imgbb_api_key.as_ref(),
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key).and_then(|v| v.parse::<u64>().ok())
}

pub fn normalize_api_version(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.starts_with('v') {
        trimmed.to_string()
    } else {
        format!("v{}", trimmed)
    }
}

pub fn parse_host_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in raw.split(',') {
        let name = item.trim().to_lowercase();
        if name.is_empty() || out.contains(&name) {
            continue;
        }
        out.push(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_version_gets_v_prefix() {
        assert_eq!(normalize_api_version("21.0"), "v21.0");
        assert_eq!(normalize_api_version("v20.0/"), "v20.0");
    }

    #[test]
    fn host_list_dedupes_and_lowercases() {
        assert_eq!(
            parse_host_list(" ImgBB, catbox,,imgbb ,0x0"),
            vec!["imgbb", "catbox", "0x0"]
        );
    }

    #[test]
    fn graph_root_joins_base_and_version() {
        let settings = Settings {
            graph_base_url: "http://127.0.0.1:9999/".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.graph_root(), "http://127.0.0.1:9999/v21.0");
    }

    #[test]
    fn missing_token_is_a_credentials_error() {
        let err = Settings::default().require_access_token().unwrap_err();
        assert_eq!(err.code, "MISSING_CREDENTIALS");
    }
}
