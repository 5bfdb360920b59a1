use crate::errors::ToolError;
use crate::managers::{
    collect_common_fields, created_id, creation_result, ensure_has_updates, fetch_record,
    fields_params, update_result,
};
use crate::models::{to_value, Ad, ListResult, AD_FIELDS};
use crate::services::graph_client::{GraphClient, Params};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;

pub const AD_TOOLS: &[&str] = &["get_ads", "get_ad_details", "create_ad", "update_ad"];

const AD_UPDATABLE: &[&str] = &["name", "status", "creative_id"];

#[derive(Clone)]
pub struct AdManager {
    logger: Logger,
    validation: Validation,
    graph: Arc<GraphClient>,
}

impl AdManager {
    pub fn new(logger: Logger, validation: Validation, graph: Arc<GraphClient>) -> Self {
        Self {
            logger: logger.child("ads"),
            validation,
            graph,
        }
    }

    pub async fn handle_tool(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "get_ads" => self.list_ads(&args).await,
            "get_ad_details" => self.ad_details(&args).await,
            "create_ad" => self.create_ad(&args).await,
            "update_ad" => self.update_ad(&args).await,
            _ => Err(unknown_tool_error("ads", tool, AD_TOOLS)),
        }
    }

    /// The narrowest container wins: ad set, then campaign, then account.
    async fn list_ads(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let limit = self.validation.ensure_limit(args.get("limit"))?;
        let adset_id = self
            .validation
            .ensure_optional_object_id(args.get("adset_id"), "adset_id")?;
        let campaign_id = self
            .validation
            .ensure_optional_object_id(args.get("campaign_id"), "campaign_id")?;
        let container = adset_id.or(campaign_id).unwrap_or(account_id);
        let page = self
            .graph
            .get_edge(&format!("{}/ads", container), &fields_params(AD_FIELDS), limit)
            .await?;
        to_value(&ListResult::<Ad>::from_page(page)?)
    }

    async fn ad_details(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self.validation.ensure_object_id(args.get("ad_id"), "ad_id")?;
        fetch_record::<Ad>(&self.graph, &id, AD_FIELDS).await
    }

    async fn create_ad(&self, args: &Value) -> Result<Value, ToolError> {
        let account_id = self.validation.ensure_account_id(args.get("account_id"))?;
        let adset_id = self.validation.ensure_object_id(args.get("adset_id"), "adset_id")?;
        let creative_id = self
            .validation
            .ensure_object_id(args.get("creative_id"), "creative_id")?;
        let mut params = Params::new();
        params.insert(
            "name".to_string(),
            Value::String(self.validation.required_string(args, "name")?),
        );
        params.insert("adset_id".to_string(), Value::String(adset_id));
        params.insert(
            "creative".to_string(),
            serde_json::json!({ "creative_id": creative_id }),
        );
        collect_common_fields(&self.validation, args, &mut params, &[], &[])?;
        params
            .entry("status".to_string())
            .or_insert_with(|| Value::String("PAUSED".to_string()));

        let response = self
            .graph
            .post(&format!("{}/ads", account_id), &params)
            .await?;
        let id = created_id(&response, "ad")?;
        self.logger.info(
            "Ad created",
            Some(&serde_json::json!({"account_id": account_id, "ad_id": id})),
        );
        Ok(creation_result::<Ad>(&self.graph, id, AD_FIELDS).await)
    }

    async fn update_ad(&self, args: &Value) -> Result<Value, ToolError> {
        let id = self.validation.ensure_object_id(args.get("ad_id"), "ad_id")?;
        let mut params = Params::new();
        collect_common_fields(&self.validation, args, &mut params, &["name"], &[])?;
        let mut updated: Vec<String> = params.keys().cloned().collect();
        if let Some(creative_id) = self
            .validation
            .ensure_optional_object_id(args.get("creative_id"), "creative_id")?
        {
            params.insert(
                "creative".to_string(),
                serde_json::json!({ "creative_id": creative_id }),
            );
            updated.push("creative_id".to_string());
        }
        ensure_has_updates(&params, "ad", AD_UPDATABLE)?;
        let response = self.graph.post(&id, &params).await?;
        self.logger.info("Ad updated", Some(&serde_json::json!({"ad_id": id})));
        Ok(update_result(&response, &id, updated))
    }
}

#[async_trait::async_trait]
impl ToolHandler for AdManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        self.handle_tool(tool, args).await
    }
}
