use crate::errors::ToolError;
use crate::managers::images::resolve_image_source;
use crate::managers::{created_id, creation_result, fields_params};
use crate::models::{to_value, AdCreative, AdImage, ListResult, CREATIVE_FIELDS};
use crate::services::graph_client::{GraphClient, Params};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub const CREATIVE_TOOLS: &[&str] = &["get_ad_creatives", "create_ad_creative", "upload_ad_image"];

#[derive(Clone)]
pub struct CreativeManager {
    logger: Logger,
    validation: Validation,
    graph: Arc<GraphClient>,
}

impl CreativeManager {
    pub fn new(logger: Logger, validation: Validation, graph: Arc<GraphClient>) -> Self {
        Self {
            logger: logger.child("creatives"),
            validation,
            graph,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "get_ad_creatives" => self.list_creatives(&args).await,
            "create_ad_creative" => self.create_creative(&args).await,
            "upload_ad_image" => self.upload_image(&args).await,
            _ => Err(unknown_tool_error("creatives", tool, CREATIVE_TOOLS)),
        }
    }

    async fn list_creatives(&self, args: &Value) -> Result<Value, ToolError> {
        let ad_id = self.validation.ensure_object_id(args.get("ad_id"), "ad_id")?;
        let limit = self.validation.ensure_limit(args.get("limit"))?;
        let page = self
            .graph
            .get_edge(
                &format!("{}/adcreatives", ad_id),
                &fields_params(CREATIVE_FIELDS),
                limit,
            )
            .await?;
        to_value(&ListResult::<AdCreative>::from_page(page)?)
    }

    async fn create_creative(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let page_id = self.validation.ensure_object_id(args.get("page_id"), "page_id")?;
        let name = self.validation.required_string(args, "name")?;
        let link_url = self.validation.required_string(args, "link_url")?;
        ensure_http_url(&link_url, "link_url")?;
        let image_hash = self.validation.required_string(args, "image_hash")?;

        let mut link_data = serde_json::Map::new();
        link_data.insert("link".to_string(), Value::String(link_url.clone()));
        link_data.insert("image_hash".to_string(), Value::String(image_hash));
        // Graph names the headline `name` inside link_data.
        for (arg, field) in [
            ("message", "message"),
            ("headline", "name"),
            ("description", "description"),
        ] {
            if let Some(value) = self
                .validation
                .ensure_optional_string(args.get(arg), arg, false)?
            {
                link_data.insert(field.to_string(), Value::String(value));
            }
        }
        if let Some(cta) = self.validation.ensure_optional_string(
            args.get("call_to_action_type"),
            "call_to_action_type",
            true,
        )? {
            link_data.insert(
                "call_to_action".to_string(),
                serde_json::json!({
                    "type": cta.to_uppercase(),
                    "value": { "link": link_url },
                }),
            );
        }

        let mut params = Params::new();
        params.insert("name".to_string(), Value::String(name));
        params.insert(
            "object_story_spec".to_string(),
            serde_json::json!({
                "page_id": page_id,
                "link_data": Value::Object(link_data),
            }),
        );

        let response = self
            .graph
            .post(&format!("{}/adcreatives", account_id), &params)
            .await?;
        let id = created_id(&response, "ad creative")?;
        self.logger.info(
            "Ad creative created",
            Some(&serde_json::json!({"account_id": account_id, "creative_id": id})),
        );
        Ok(creation_result::<AdCreative>(&self.graph, id, CREATIVE_FIELDS).await)
    }

    async fn upload_image(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let payload = resolve_image_source(&self.validation, self.graph.http(), args).await?;
        let name = self
            .validation
            .ensure_optional_string(args.get("name"), "name", true)?
            .unwrap_or_else(|| payload.filename());

        let mut params = Params::new();
        params.insert("bytes".to_string(), Value::String(payload.to_base64()));
        params.insert("name".to_string(), Value::String(name));
        let response = self
            .graph
            .post(&format!("{}/adimages", account_id), &params)
            .await?;
        let images = AdImage::from_upload_response(&response)?;
        self.logger.info(
            "Ad image uploaded",
            Some(&serde_json::json!({
                "account_id": account_id,
                "bytes": payload.data.len(),
                "hash": images[0].hash,
            })),
        );
        Ok(serde_json::json!({
            "success": true,
            "hash": images[0].hash,
            "images": to_value(&images)?,
        }))
    }
}

pub(crate) fn ensure_http_url(raw: &str, label: &str) -> Result<(), ToolError> {
    let parsed = Url::parse(raw)
        .map_err(|err| ToolError::invalid_params(format!("{} is not a valid URL: {}", label, err)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ToolError::invalid_params(format!(
            "{} must use http or https",
            label
        )));
    }
    Ok(())
}

#[async_trait::async_trait]
impl ToolHandler for CreativeManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_tool(tool, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_url_must_be_http() {
        assert!(ensure_http_url("https://shop.example/spring", "link_url").is_ok());
        assert!(ensure_http_url("ftp://shop.example", "link_url").is_err());
        assert!(ensure_http_url("shop.example", "link_url").is_err());
    }
}
