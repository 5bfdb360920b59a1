use crate::constants::hosting;
use crate::errors::ToolError;
use crate::models::to_value;
use crate::services::image_gen::{ensure_model_name, GenerateOptions, ImageGenerator};
use crate::services::image_host::{download_image, ImagePayload, UploadChain};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

pub const IMAGE_TOOLS: &[&str] = &["generate_ad_image", "host_image"];

const ASPECT_RATIOS: &[&str] = &[
    "1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9",
];

#[derive(Clone)]
pub struct ImageManager {
    logger: Logger,
    validation: Validation,
    generator: Arc<ImageGenerator>,
    chain: Arc<UploadChain>,
    http: Client,
}

impl ImageManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        generator: Arc<ImageGenerator>,
        chain: Arc<UploadChain>,
        http: Client,
    ) -> Self {
        Self {
            logger: logger.child("images"),
            validation,
            generator,
            chain,
            http,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "generate_ad_image" => self.generate(&args).await,
            "host_image" => self.host(&args).await,
            _ => Err(unknown_tool_error("images", tool, IMAGE_TOOLS)),
        }
    }

    async fn generate(&self, args: &Value) -> Result<Value, ToolError> {
        let prompt = self.validation.required_string(args, "prompt")?;
        let aspect_ratio = self
            .validation
            .ensure_optional_string(args.get("aspect_ratio"), "aspect_ratio", true)?;
        if let Some(ratio) = aspect_ratio.as_deref() {
            if !ASPECT_RATIOS.contains(&ratio) {
                return Err(ToolError::invalid_params(format!(
                    "aspect_ratio must be one of {}",
                    ASPECT_RATIOS.join(", ")
                )));
            }
        }
        let model = self
            .validation
            .ensure_optional_string(args.get("model"), "model", true)?;
        if let Some(name) = model.as_deref() {
            ensure_model_name(name)?;
        }
        let host = match args.get("host") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(ToolError::invalid_params("host must be a boolean")),
        };

        let output = self
            .generator
            .generate(&prompt, &GenerateOptions { model, aspect_ratio })
            .await?;

        let mut images = Vec::with_capacity(output.images.len());
        for image in &output.images {
            let mut entry = to_value(image)?;
            let payload = ImagePayload::new(image.data.clone(), Some(&image.mime_type));
            if !host {
                entry["url"] = Value::String(payload.to_data_url());
                images.push(entry);
                continue;
            }
            match self.chain.upload(&payload).await {
                Ok(hosted) => {
                    entry["url"] = Value::String(hosted.url);
                    entry["provider"] = Value::String(hosted.provider);
                    entry["fallback"] = Value::Bool(hosted.fallback);
                    entry["attempts"] = to_value(&hosted.attempts)?;
                }
                // The image was generated; a hosting failure is reported
                // per image instead of failing the whole call.
                Err(err) => {
                    self.logger.warn(
                        "Generated image could not be hosted",
                        Some(&serde_json::json!({"sha256": image.sha256, "code": err.code})),
                    );
                    entry["url"] = Value::Null;
                    entry["hosting_error"] = serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "details": err.details,
                    });
                }
            }
            images.push(entry);
        }

        Ok(serde_json::json!({
            "model": output.model,
            "count": images.len(),
            "images": images,
            "notes": output.notes,
        }))
    }

    async fn host(&self, args: &Value) -> Result<Value, ToolError> {
        let payload = resolve_image_source(&self.validation, &self.http, args).await?;
        let hosted = self.chain.upload(&payload).await?;
        to_value(&hosted)
    }
}

/// Exactly one of `image_url` / `image_base64`; `mime_type` overrides
/// sniffing when given.
pub(crate) async fn resolve_image_source(
    validation: &Validation,
    http: &Client,
    args: &Value,
) -> Result<ImagePayload, ToolError> {
    let image_url = validation.ensure_optional_string(args.get("image_url"), "image_url", true)?;
    let image_base64 =
        validation.ensure_optional_string(args.get("image_base64"), "image_base64", false)?;
    let mime_type = validation.ensure_optional_string(args.get("mime_type"), "mime_type", true)?;
    if let Some(mime) = mime_type.as_deref() {
        if !mime.to_lowercase().starts_with("image/") {
            return Err(ToolError::invalid_params("mime_type must be an image/* type"));
        }
    }
    match (image_url, image_base64) {
        (Some(_), Some(_)) => Err(ToolError::invalid_params(
            "Provide either image_url or image_base64, not both",
        )),
        (None, None) => Err(ToolError::invalid_params(
            "One of image_url or image_base64 is required",
        )),
        (Some(url), None) => {
            let payload = download_image(http, &url, hosting::DOWNLOAD_MAX_BYTES).await?;
            Ok(match mime_type {
                Some(mime) => ImagePayload::new(payload.data, Some(&mime)),
                None => payload,
            })
        }
        (None, Some(encoded)) => ImagePayload::from_base64(&encoded, mime_type.as_deref()),
    }
}

#[async_trait::async_trait]
impl ToolHandler for ImageManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_tool(tool, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn image_source_requires_exactly_one() {
        let validation = Validation::new();
        let http = Client::new();
        let both = json!({"image_url": "https://x.test/a.png", "image_base64": "aGk="});
        assert!(resolve_image_source(&validation, &http, &both).await.is_err());
        let neither = json!({});
        let err = resolve_image_source(&validation, &http, &neither)
            .await
            .unwrap_err();
        assert!(err.message.contains("required"));
    }

    #[tokio::test]
    async fn base64_source_honours_mime_override() {
        let validation = Validation::new();
        let args = json!({"image_base64": "aGVsbG8=", "mime_type": "image/jpeg"});
        let payload = resolve_image_source(&validation, &Client::new(), &args)
            .await
            .unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(&payload.data[..], b"hello");
    }

    #[tokio::test]
    async fn non_image_mime_is_rejected() {
        let args = json!({"image_base64": "aGVsbG8=", "mime_type": "text/plain"});
        assert!(resolve_image_source(&Validation::new(), &Client::new(), &args)
            .await
            .is_err());
    }
}
