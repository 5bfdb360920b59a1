use crate::constants::{gemini, network};
use crate::errors::{ToolError, ToolErrorKind};
use crate::services::logger::Logger;
use crate::services::settings::Settings;
use crate::utils::redact::redact_text;
use base64::Engine;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

static MODEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("model name regex"));

/// Model names become a URL path segment, so only plain identifiers pass.
pub fn ensure_model_name(model: &str) -> Result<(), ToolError> {
    if !MODEL_NAME.is_match(model) || model == "." || model.contains("..") {
        return Err(ToolError::invalid_params(format!(
            "model must contain only letters, digits, '.', '_' or '-', got '{}'",
            model
        ))
        .with_hint("Example: gemini-2.5-flash-image"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: usize,
    pub sha256: String,
    #[serde(skip)]
    pub data: Bytes,
}

impl GeneratedImage {
    pub fn new(data: Bytes, mime_type: Option<String>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&data);
        Self {
            mime_type: mime_type
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| gemini::DEFAULT_MIME_TYPE.to_string()),
            bytes: data.len(),
            sha256: hex::encode(hasher.finalize()),
            data,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub model: Option<String>,
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    pub model: String,
    pub images: Vec<GeneratedImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Clone)]
pub struct ImageGenerator {
    logger: Logger,
    settings: Arc<Settings>,
    http: Client,
}

impl ImageGenerator {
    pub fn new(logger: Logger, settings: Arc<Settings>, http: Client) -> Self {
        Self {
            logger: logger.child("image_gen"),
            settings,
            http,
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<GenerationOutput, ToolError> {
        let api_key = self
            .settings
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| ToolError::missing_credentials("GEMINI_API_KEY"))?;
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.settings.gemini_image_model.clone());
        ensure_model_name(&model)?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.gemini_base_url.trim_end_matches('/'),
            model
        );

        let mut generation_config = serde_json::json!({
            "responseModalities": ["TEXT", "IMAGE"],
        });
        if let Some(ratio) = options.aspect_ratio.as_ref() {
            generation_config["imageConfig"] = serde_json::json!({ "aspectRatio": ratio });
        }
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": generation_config,
        });

        self.logger.info(
            "Generating image",
            Some(&serde_json::json!({"model": model, "prompt_chars": prompt.chars().count()})),
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .timeout(Duration::from_millis(network::TIMEOUT_IMAGE_GENERATION_MS))
            .json(&body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !(200..300).contains(&status) {
            return Err(classify_generation_error(status, &payload, &self.settings.secrets()));
        }

        let (images, notes) = extract_inline_images(&payload)?;
        if images.is_empty() {
            return Err(no_image_error(&payload, notes));
        }
        Ok(GenerationOutput {
            model,
            images,
            notes,
        })
    }
}

/// Pulls every `inlineData` part (either casing) out of a generateContent
/// response. Text parts are returned alongside as notes.
pub fn extract_inline_images(
    payload: &Value,
) -> Result<(Vec<GeneratedImage>, Vec<String>), ToolError> {
    let mut images = Vec::new();
    let mut notes = Vec::new();
    let candidates = payload
        .get("candidates")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    for candidate in candidates {
        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .cloned()
            .unwrap_or_default();
        for part in parts {
            if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    notes.push(text.trim().to_string());
                }
                continue;
            }
            let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
                continue;
            };
            let data = inline.get("data").and_then(|v| v.as_str()).unwrap_or("");
            if data.is_empty() {
                continue;
            }
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(data.as_bytes())
                .map_err(|err| {
                    ToolError::new(
                        ToolErrorKind::Internal,
                        "UPSTREAM_INVALID_IMAGE",
                        format!("Image part is not valid base64: {}", err),
                    )
                })?;
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            images.push(GeneratedImage::new(Bytes::from(decoded), mime_type));
        }
    }
    Ok((images, notes))
}

fn no_image_error(payload: &Value, notes: Vec<String>) -> ToolError {
    if let Some(reason) = payload
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|v| v.as_str())
    {
        return ToolError::new(
            ToolErrorKind::Denied,
            "PROMPT_BLOCKED",
            format!("The image model refused the prompt ({})", reason),
        )
        .with_hint("Rephrase the prompt; it was blocked by the model's safety filters.")
        .with_details(serde_json::json!({ "block_reason": reason }));
    }
    let finish_reason = payload
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("finishReason"))
        .cloned()
        .unwrap_or(Value::Null);
    ToolError::new(
        ToolErrorKind::Internal,
        "NO_IMAGE_RETURNED",
        "The image model returned no image data",
    )
    .with_details(serde_json::json!({
        "finish_reason": finish_reason,
        "text": notes,
    }))
}

fn classify_generation_error(status: u16, payload: &Value, secrets: &[String]) -> ToolError {
    let message = payload
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| payload.as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| format!("Image generation failed with HTTP {}", status));
    let message = redact_text(&message, 512, Some(secrets));
    let (kind, code) = match status {
        400 => (ToolErrorKind::InvalidParams, "INVALID_PARAMETER"),
        401 | 403 => (ToolErrorKind::Denied, "AUTH_INVALID"),
        404 => (ToolErrorKind::NotFound, "MODEL_NOT_FOUND"),
        429 => (ToolErrorKind::Retryable, "RATE_LIMITED"),
        s if s >= 500 => (ToolErrorKind::Retryable, "UPSTREAM_UNAVAILABLE"),
        _ => (ToolErrorKind::Internal, "UPSTREAM_ERROR"),
    };
    ToolError::new(kind, code, message).with_details(serde_json::json!({ "status": status }))
}
