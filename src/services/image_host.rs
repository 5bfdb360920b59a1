use crate::errors::{ToolError, ToolErrorKind};
use crate::services::logger::Logger;
use crate::services::settings::Settings;
use crate::utils::redact::redact_text;
use async_trait::async_trait;
use base64::Engine;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Transport(err.without_url().to_string())
    }
}

/// Raw image bytes plus what the hosts need to name them.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub data: Bytes,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn new(data: Bytes, mime_type: Option<&str>) -> Self {
        let mime_type = mime_type
            .map(|m| m.trim().to_lowercase())
            .filter(|m| m.starts_with("image/"))
            .or_else(|| sniff_mime(&data).map(|m| m.to_string()))
            .unwrap_or_else(|| "image/png".to_string());
        Self { data, mime_type }
    }

    /// Accepts bare base64 or a `data:image/...;base64,` URL.
    pub fn from_base64(raw: &str, mime_type: Option<&str>) -> Result<Self, ToolError> {
        let trimmed = raw.trim();
        let (declared, encoded) = match trimmed.strip_prefix("data:") {
            Some(rest) => {
                let (header, body) = rest.split_once(',').ok_or_else(|| {
                    ToolError::invalid_params("image_base64 data URL is missing ','")
                })?;
                let mime = header.trim_end_matches(";base64").to_string();
                (Some(mime), body)
            }
            None => (None, trimmed),
        };
        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|err| {
                ToolError::invalid_params(format!("image_base64 is not valid base64: {}", err))
            })?;
        if decoded.is_empty() {
            return Err(ToolError::invalid_params("image_base64 decodes to zero bytes"));
        }
        Ok(Self::new(
            Bytes::from(decoded),
            mime_type.or(declared.as_deref()),
        ))
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "png",
        }
    }

    pub fn filename(&self) -> String {
        format!("image.{}", self.extension())
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG") {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF8") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    fn name(&self) -> &'static str;
    async fn upload(&self, payload: &ImagePayload) -> Result<String, UploadError>;
}

pub struct ImgbbHost {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ImgbbHost {
    pub fn new(http: Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            http,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl ImageHost for ImgbbHost {
    fn name(&self) -> &'static str {
        "imgbb"
    }

    async fn upload(&self, payload: &ImagePayload) -> Result<String, UploadError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UploadError::NotConfigured("IMGBB_API_KEY"))?;
        let form = [
            ("key", api_key.to_string()),
            ("image", payload.to_base64()),
            ("name", payload.filename()),
        ];
        let response = self.http.post(&self.endpoint).form(&form).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(UploadError::Status {
                status,
                body: text,
            });
        }
        let body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|_| UploadError::InvalidResponse("body is not JSON".to_string()))?;
        body.get("data")
            .and_then(|d| d.get("url").or_else(|| d.get("display_url")))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| UploadError::InvalidResponse("missing data.url".to_string()))
    }
}

/// Anonymous multipart hosts that answer with the bare URL as the body.
pub struct MultipartHost {
    name: &'static str,
    http: Client,
    endpoint: String,
    file_field: &'static str,
    extra_fields: Vec<(&'static str, &'static str)>,
}

impl MultipartHost {
    pub fn catbox(http: Client, endpoint: String) -> Self {
        Self {
            name: "catbox",
            http,
            endpoint,
            file_field: "fileToUpload",
            extra_fields: vec![("reqtype", "fileupload")],
        }
    }

    pub fn null_pointer(http: Client, endpoint: String) -> Self {
        Self {
            name: "0x0",
            http,
            endpoint,
            file_field: "file",
            extra_fields: Vec::new(),
        }
    }
}

#[async_trait]
impl ImageHost for MultipartHost {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn upload(&self, payload: &ImagePayload) -> Result<String, UploadError> {
        let part = Part::bytes(payload.data.to_vec())
            .file_name(payload.filename())
            .mime_str(&payload.mime_type)?;
        let mut form = Form::new();
        for (key, value) in &self.extra_fields {
            form = form.text(*key, *value);
        }
        form = form.part(self.file_field, part);
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(UploadError::Status {
                status,
                body: text,
            });
        }
        Ok(text.trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadAttempt {
    pub provider: String,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostedImage {
    pub url: String,
    pub provider: String,
    pub fallback: bool,
    pub mime_type: String,
    pub bytes: usize,
    pub attempts: Vec<UploadAttempt>,
}

/// Ordered list of hosts. The first host returning a usable public URL
/// wins; failures are recorded and the next host is tried. When every host
/// fails the image is returned inline as a data URL.
pub struct UploadChain {
    logger: Logger,
    hosts: Vec<Arc<dyn ImageHost>>,
    data_url_max_bytes: usize,
    secrets: Vec<String>,
}

impl UploadChain {
    pub fn new(logger: Logger, hosts: Vec<Arc<dyn ImageHost>>, data_url_max_bytes: usize) -> Self {
        Self {
            logger: logger.child("image_host"),
            hosts,
            data_url_max_bytes,
            secrets: Vec::new(),
        }
    }

    pub fn from_settings(logger: Logger, settings: &Settings, http: Client) -> Self {
        let mut hosts: Vec<Arc<dyn ImageHost>> = Vec::new();
        for name in &settings.image_hosts {
            match name.as_str() {
                "imgbb" => hosts.push(Arc::new(ImgbbHost::new(
                    http.clone(),
                    settings.imgbb_upload_url.clone(),
                    settings.imgbb_api_key.clone(),
                ))),
                "catbox" => hosts.push(Arc::new(MultipartHost::catbox(
                    http.clone(),
                    settings.catbox_upload_url.clone(),
                ))),
                "0x0" => hosts.push(Arc::new(MultipartHost::null_pointer(
                    http.clone(),
                    settings.null_pointer_upload_url.clone(),
                ))),
                other => logger.warn(
                    "Ignoring unknown image host",
                    Some(&serde_json::json!({ "provider": other })),
                ),
            }
        }
        let mut chain = Self::new(logger, hosts, settings.data_url_max_bytes);
        chain.secrets = settings.secrets();
        chain
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.hosts.iter().map(|h| h.name()).collect()
    }

    pub async fn upload(&self, payload: &ImagePayload) -> Result<HostedImage, ToolError> {
        let mut attempts = Vec::new();

        for host in &self.hosts {
            let outcome = match host.upload(payload).await {
                Ok(raw_url) => validate_public_url(&raw_url),
                Err(err) => Err(err),
            };
            match outcome {
                Ok(url) => {
                    attempts.push(UploadAttempt {
                        provider: host.name().to_string(),
                        status: AttemptStatus::Succeeded,
                        error: None,
                    });
                    self.logger.info(
                        "Image hosted",
                        Some(&serde_json::json!({"provider": host.name(), "bytes": payload.data.len()})),
                    );
                    return Ok(HostedImage {
                        url,
                        provider: host.name().to_string(),
                        fallback: false,
                        mime_type: payload.mime_type.clone(),
                        bytes: payload.data.len(),
                        attempts,
                    });
                }
                Err(UploadError::NotConfigured(var)) => {
                    attempts.push(UploadAttempt {
                        provider: host.name().to_string(),
                        status: AttemptStatus::Skipped,
                        error: Some(format!("{} is not configured", var)),
                    });
                }
                Err(err) => {
                    let message = redact_text(&err.to_string(), 300, Some(&self.secrets));
                    self.logger.warn(
                        "Image host failed",
                        Some(&serde_json::json!({"provider": host.name(), "error": message})),
                    );
                    attempts.push(UploadAttempt {
                        provider: host.name().to_string(),
                        status: AttemptStatus::Failed,
                        error: Some(message),
                    });
                }
            }
        }

        if payload.data.len() > self.data_url_max_bytes {
            return Err(ToolError::new(
                ToolErrorKind::Retryable,
                "UPLOAD_FAILED",
                "No image host accepted the upload and the image is too large to inline",
            )
            .with_details(serde_json::json!({
                "bytes": payload.data.len(),
                "data_url_max_bytes": self.data_url_max_bytes,
                "attempts": attempts,
            })));
        }

        self.logger.warn(
            "All image hosts failed, returning data URL",
            Some(&serde_json::json!({"attempts": attempts.len()})),
        );
        Ok(HostedImage {
            url: payload.to_data_url(),
            provider: "data_url".to_string(),
            fallback: true,
            mime_type: payload.mime_type.clone(),
            bytes: payload.data.len(),
            attempts,
        })
    }
}

fn validate_public_url(raw: &str) -> Result<String, UploadError> {
    let parsed = Url::parse(raw.trim()).map_err(|_| {
        UploadError::InvalidResponse(format!("not a URL: {}", redact_text(raw, 120, None)))
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UploadError::InvalidResponse(format!(
            "unsupported URL scheme '{}'",
            parsed.scheme()
        )));
    }
    Ok(parsed.to_string())
}

/// Fetches an image over http(s), refusing bodies above `max_bytes`.
pub async fn download_image(
    http: &Client,
    raw_url: &str,
    max_bytes: usize,
) -> Result<ImagePayload, ToolError> {
    let url = Url::parse(raw_url.trim())
        .map_err(|err| ToolError::invalid_params(format!("image_url is not a valid URL: {}", err)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ToolError::invalid_params("image_url must use http or https"));
    }
    let response = http.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::new(
            if status.as_u16() == 404 {
                ToolErrorKind::NotFound
            } else {
                ToolErrorKind::Retryable
            },
            "IMAGE_DOWNLOAD_FAILED",
            format!("Downloading image_url failed with HTTP {}", status.as_u16()),
        ));
    }
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_lowercase());
    if let Some(ct) = content_type.as_deref() {
        if !ct.is_empty() && !ct.starts_with("image/") && ct != "application/octet-stream" {
            return Err(ToolError::invalid_params(format!(
                "image_url does not point to an image (content-type {})",
                ct
            )));
        }
    }
    if let Some(len) = response.content_length() {
        if len as usize > max_bytes {
            return Err(image_too_large(max_bytes));
        }
    }

    let body = read_capped(response.bytes_stream(), max_bytes).await?;
    if body.is_empty() {
        return Err(ToolError::invalid_params("image_url returned an empty body"));
    }
    Ok(ImagePayload::new(
        body,
        content_type.as_deref().filter(|ct| ct.starts_with("image/")),
    ))
}

/// Collects a body stream, giving up as soon as it grows past `max_bytes`.
/// Servers may omit or understate `Content-Length`.
async fn read_capped<S, E>(stream: S, max_bytes: usize) -> Result<Bytes, ToolError>
where
    S: Stream<Item = Result<Bytes, E>>,
    ToolError: From<E>,
{
    futures::pin_mut!(stream);
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if buffer.len() + chunk.len() > max_bytes {
            return Err(image_too_large(max_bytes));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

fn image_too_large(max_bytes: usize) -> ToolError {
    ToolError::invalid_params(format!("Image exceeds the {} byte limit", max_bytes))
}
